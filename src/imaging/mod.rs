//! Image processing in pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::ImageReader`, PNG or JPEG chosen by extension |
//! | **Fit** | `resize_exact` with Catmull-Rom, longer edge bounded |
//! | **Encode** | `JpegEncoder` |
//!
//! [`create_thumbnail`] is the entry point: it picks the decoder from the
//! source extension ([`plan_thumbnail`]) and hands the plan to an
//! [`ImageBackend`]. [`RustBackend`] does the pixel work; the fit math lives
//! in [`calculate_fit_dimensions`] so it can be tested without images.

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend, Rendered};
pub use calculations::calculate_fit_dimensions;
pub use operations::{ThumbnailConfig, create_thumbnail, plan_thumbnail};
pub use params::{Quality, SourceFormat, ThumbnailParams};
pub use rust_backend::RustBackend;
