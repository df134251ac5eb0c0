//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Calculate the size of an image fitted inside a square bound.
///
/// The longer edge becomes `min(max_edge, longer edge)`; the shorter edge is
/// scaled by the same ratio and rounded, never below 1px. Images already
/// inside the bound are returned unchanged (no upscaling).
///
/// # Arguments
/// * `original` - Source dimensions (width, height)
/// * `max_edge` - Upper bound for the longer edge in pixels
///
/// # Returns
/// * `(width, height)` - Fitted dimensions
///
/// # Examples
/// ```
/// # use phototree::imaging::calculate_fit_dimensions;
/// // 4000x3000 landscape bounded to 1200 → 1200x900
/// assert_eq!(calculate_fit_dimensions((4000, 3000), 1200), (1200, 900));
///
/// // Small images are left alone
/// assert_eq!(calculate_fit_dimensions((640, 480), 1200), (640, 480));
/// ```
pub fn calculate_fit_dimensions(original: (u32, u32), max_edge: u32) -> (u32, u32) {
    let (orig_w, orig_h) = original;
    let longer_edge = orig_w.max(orig_h);

    if longer_edge <= max_edge || longer_edge == 0 {
        return original;
    }

    let ratio = max_edge as f64 / longer_edge as f64;
    let scale = |edge: u32| ((edge as f64 * ratio).round() as u32).max(1);

    if orig_w >= orig_h {
        // Landscape or square
        (max_edge, scale(orig_h))
    } else {
        // Portrait
        (scale(orig_w), max_edge)
    }
}
