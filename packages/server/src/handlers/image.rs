use axum::Json;
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use common::image::GenerateImageRequest;
use tracing::{info, instrument};

use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::models::image::{GenerateImageBody, ImageModelsResponse};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/models",
    tag = "Images",
    operation_id = "listImageModels",
    summary = "List available image models",
    responses(
        (status = 200, description = "Available models and the default", body = ImageModelsResponse),
    ),
)]
pub async fn list_models() -> Json<ImageModelsResponse> {
    Json(ImageModelsResponse::available())
}

#[utoipa::path(
    post,
    path = "/generate",
    tag = "Images",
    operation_id = "generateImage",
    summary = "Generate an image from a prompt",
    description = "Calls the image provider and returns the raw image. Nothing is stored. \
        The model used is echoed in the `X-Image-Model` header.",
    request_body = GenerateImageBody,
    responses(
        (status = 200, description = "Generated image", content_type = "image/png"),
        (status = 400, description = "Empty prompt or unknown model (VALIDATION_ERROR)", body = ErrorBody),
        (status = 502, description = "Provider failure (PROVIDER_ERROR)", body = ErrorBody),
        (status = 503, description = "Provider busy (PROVIDER_UNAVAILABLE)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn generate_image(
    State(state): State<AppState>,
    AppJson(payload): AppJson<GenerateImageBody>,
) -> Result<impl IntoResponse, AppError> {
    let request = GenerateImageRequest::try_from(payload)?;
    let image = state.images.generate(&request).await?;
    info!(model = %image.model, size = image.bytes.len(), "Image generated");

    Ok((
        [
            (header::CONTENT_TYPE, image.content_type),
            (header::HeaderName::from_static("x-image-model"), image.model.id().to_string()),
        ],
        image.bytes,
    ))
}
