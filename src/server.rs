//! HTTP server: router and handlers.
//!
//! Every route except `/health` takes one required `path` query parameter
//! holding a virtual path:
//!
//! | Route                 | Response                                        |
//! |-----------------------|-------------------------------------------------|
//! | `GET /ls?path=`       | JSON array of listing entries                   |
//! | `GET /get?path=`      | file bytes, content type by extension           |
//! | `GET /download?path=` | file bytes as an attachment                     |
//! | `GET /thumb?path=`    | thumbnail metadata JSON, generated on first use |
//! | `GET /health`         | `{"status":"ok"}`                               |
//!
//! Handlers are thin: they hand the virtual path to the [`Library`] on the
//! blocking pool and map its errors to status codes. Client mistakes
//! (unknown alias, missing file, undecodable image) are `400` with the
//! message in a JSON body. A path the registry cannot map back is a bug on
//! our side: it is logged at error level and answered with `500`.

use crate::imaging::{ImageBackend, RustBackend};
use crate::library::{Library, LibraryError};
use crate::listing::Entry;
use axum::Router;
use axum::extract::{Query, Request, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Debug, Deserialize)]
pub struct PathQuery {
    pub path: String,
}

/// Error half of every handler's result.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Internal(String),
}

impl From<LibraryError> for ApiError {
    fn from(err: LibraryError) -> Self {
        if err.is_internal() {
            tracing::error!(error = %err, "path registry invariant violated");
            Self::Internal(err.to_string())
        } else {
            Self::BadRequest(err.to_string())
        }
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        Self::BadRequest(format!("IO error: {err}"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            Self::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

/// Build the application router.
pub fn router<B>(library: Arc<Library<B>>, cors: bool) -> Router
where
    B: ImageBackend + Send + 'static,
{
    let app = Router::new()
        .route("/ls", get(list::<B>))
        .route("/get", get(get_file::<B>))
        .route("/download", get(download::<B>))
        .route("/thumb", get(thumb::<B>))
        .route("/health", get(health))
        .with_state(library)
        .layer(middleware::from_fn(log_request));

    if cors {
        app.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        app
    }
}

/// Serve until Ctrl-C.
pub async fn serve(
    bind: SocketAddr,
    library: Arc<Library<RustBackend>>,
    cors: bool,
) -> std::io::Result<()> {
    let app = router(library, cors);
    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!(%bind, cors, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("shutting down");
        })
        .await
}

// -- Handlers --

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn list<B: ImageBackend + Send + 'static>(
    State(library): State<Arc<Library<B>>>,
    Query(query): Query<PathQuery>,
) -> Result<Json<Vec<Entry>>, ApiError> {
    let entries = run_blocking(library, move |lib| lib.list(&query.path)).await?;
    Ok(Json(entries))
}

async fn get_file<B: ImageBackend + Send + 'static>(
    State(library): State<Arc<Library<B>>>,
    Query(query): Query<PathQuery>,
) -> Result<Response, ApiError> {
    let absolute = library.resolve(&query.path)?;
    let bytes = tokio::fs::read(&absolute).await?;
    Ok(([(header::CONTENT_TYPE, content_type(&absolute))], bytes).into_response())
}

async fn download<B: ImageBackend + Send + 'static>(
    State(library): State<Arc<Library<B>>>,
    Query(query): Query<PathQuery>,
) -> Result<Response, ApiError> {
    let absolute = library.resolve(&query.path)?;
    let bytes = tokio::fs::read(&absolute).await?;
    let disposition = format!(
        "attachment; filename=\"{}\"",
        attachment_name(&query.path)
    );
    let disposition = HeaderValue::from_str(&disposition)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(content_type(&absolute))),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

async fn thumb<B: ImageBackend + Send + 'static>(
    State(library): State<Arc<Library<B>>>,
    Query(query): Query<PathQuery>,
) -> Result<Response, ApiError> {
    let artifact = run_blocking(library, move |lib| lib.thumbnail(&query.path)).await?;
    let bytes = tokio::fs::read(&artifact.metadata_path).await?;
    Ok(([(header::CONTENT_TYPE, "application/json")], bytes).into_response())
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let started = std::time::Instant::now();
    let response = next.run(request).await;
    tracing::info!(
        %method,
        %uri,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request"
    );
    response
}

// -- Helpers --

/// Run library work on the blocking pool.
async fn run_blocking<B, T, F>(library: Arc<Library<B>>, work: F) -> Result<T, ApiError>
where
    B: ImageBackend + Send + 'static,
    T: Send + 'static,
    F: FnOnce(&Library<B>) -> Result<T, LibraryError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || work(&library))
        .await
        .map_err(|e| ApiError::Internal(format!("worker failed: {e}")))?
        .map_err(ApiError::from)
}

fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("json") => "application/json",
        _ => "application/octet-stream",
    }
}

/// Base name of a virtual path, reduced to characters that are safe inside
/// a quoted header parameter.
fn attachment_name(virtual_path: &str) -> String {
    let base = virtual_path
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default();
    let name: String = base
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii_graphic() || c == ' ' => c,
            _ => '_',
        })
        .collect();
    if name.is_empty() {
        "download".to_string()
    } else {
        name
    }
}
