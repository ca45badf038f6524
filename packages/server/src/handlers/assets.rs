use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use tracing::instrument;

use common::storage::KEY_PREFIX;

use crate::error::AppError;
use crate::state::AppState;

/// Serve a stored advertisement image by its storage key.
///
/// Only keys under the advertisement prefix are served; staging files and
/// anything else in the backend read as missing.
#[instrument(skip(state))]
pub async fn serve_asset(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let servable = key
        .strip_prefix(KEY_PREFIX)
        .is_some_and(|rest| rest.starts_with('/'));
    if !servable {
        return Err(AppError::NotFound(format!("Asset '{key}' not found")));
    }

    let content = state.assets.get(&key).await?;
    let mime = mime_guess::from_path(&key).first_or_octet_stream();

    Response::builder()
        .header(header::CONTENT_TYPE, mime.as_ref())
        .header(header::CACHE_CONTROL, "public, max-age=3600")
        .body(Body::from(content))
        .map_err(|e| AppError::Internal(e.to_string()))
}
