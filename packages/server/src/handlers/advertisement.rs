use axum::extract::multipart::Field;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use common::AdStatus;
use tracing::{info, instrument};

use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::extractors::query::AppQuery;
use crate::lifecycle::AdvertisementQuery;
use crate::models::advertisement::{
    ActiveAdvertisementsResponse, AdvertisementListQuery, AdvertisementListResponse,
    AdvertisementResponse, CreateAdvertisementFields, GenerateAdvertisementRequest,
    UpdateAdvertisementRequest,
};
use crate::state::AppState;

/// Headroom over the image limit for the text parts of the form.
const FORM_OVERHEAD: u64 = 1024 * 1024;

pub fn create_body_limit(max_image_size: u64) -> DefaultBodyLimit {
    DefaultBodyLimit::max((max_image_size + FORM_OVERHEAD) as usize)
}

struct UploadedImage {
    bytes: Vec<u8>,
    content_type: String,
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Advertisements",
    operation_id = "createAdvertisement",
    summary = "Create an advertisement from an uploaded image",
    description = "Multipart form with an `image` file part and the text fields `description`, \
        `start_time`, `end_time` (ISO 8601; timestamps without an offset are read as UTC) and \
        `impression_count`. All fields are validated before the image is stored. The new \
        advertisement starts `active` with zero impressions.",
    request_body(content_type = "multipart/form-data", description = "Image plus advertisement fields"),
    responses(
        (status = 201, description = "Advertisement created", body = AdvertisementResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 413, description = "Image too large (PAYLOAD_TOO_LARGE)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, multipart))]
pub async fn create_advertisement(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let max_size = state.config.storage.max_image_size;
    let mut fields = CreateAdvertisementFields::default();
    let mut image: Option<UploadedImage> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        match field.name() {
            Some("image") => image = Some(read_image(field, max_size).await?),
            Some("description") => fields.description = Some(read_text(field).await?),
            Some("start_time") => fields.start_time = Some(read_text(field).await?),
            Some("end_time") => fields.end_time = Some(read_text(field).await?),
            Some("impression_count") => fields.impression_count = Some(read_text(field).await?),
            _ => {} // Ignore unknown fields.
        }
    }

    let image = image.ok_or_else(|| AppError::Validation("Missing 'image' field".into()))?;
    let draft = fields.into_draft()?;

    let ad = state
        .engine
        .create_with_image(draft, &image.bytes, &image.content_type)
        .await?;

    Ok((StatusCode::CREATED, Json(AdvertisementResponse::from(ad))))
}

/// Buffer the image part, stopping as soon as it exceeds `max_size`.
async fn read_image(mut field: Field<'_>, max_size: u64) -> Result<UploadedImage, AppError> {
    let content_type = match field.content_type() {
        Some(ct) if ct != "application/octet-stream" => ct.to_string(),
        _ => field
            .file_name()
            .and_then(|name| mime_guess::from_path(name).first())
            .map(|m| m.to_string())
            .unwrap_or_else(|| "application/octet-stream".into()),
    };
    if !content_type.starts_with("image/") {
        return Err(AppError::Validation(format!(
            "Only image files are accepted, got '{content_type}'"
        )));
    }

    let mut bytes = Vec::new();
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read image: {e}")))?
    {
        if (bytes.len() + chunk.len()) as u64 > max_size {
            return Err(AppError::PayloadTooLarge(format!(
                "Image must not exceed {} MiB",
                max_size / (1024 * 1024)
            )));
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(UploadedImage {
        bytes,
        content_type,
    })
}

async fn read_text(field: Field<'_>) -> Result<String, AppError> {
    let name = field.name().unwrap_or_default().to_string();
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read {name}: {e}")))
}

#[utoipa::path(
    post,
    path = "/generate",
    tag = "Advertisements",
    operation_id = "generateAdvertisement",
    summary = "Create an advertisement with a generated image",
    description = "Generates the creative from `prompt` with the selected image model, stores it, \
        and creates the advertisement. Advertisement fields are validated before the provider \
        is called. Returns 503 with `Retry-After` while the model is loading.",
    request_body = GenerateAdvertisementRequest,
    responses(
        (status = 201, description = "Advertisement created", body = AdvertisementResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 502, description = "Provider failure (PROVIDER_ERROR)", body = ErrorBody),
        (status = 503, description = "Provider busy (PROVIDER_UNAVAILABLE)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn generate_advertisement(
    State(state): State<AppState>,
    AppJson(payload): AppJson<GenerateAdvertisementRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (draft, request) = payload.into_parts()?;

    let ad = state
        .engine
        .create_from_generated(draft, state.images.as_ref(), &request)
        .await?;

    Ok((StatusCode::CREATED, Json(AdvertisementResponse::from(ad))))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Advertisements",
    operation_id = "listAdvertisements",
    summary = "List advertisements",
    description = "Returns advertisements ordered by id, optionally filtered by status. \
        `limit` defaults to 100 and is clamped to 1-1000.",
    params(AdvertisementListQuery),
    responses(
        (status = 200, description = "Page of advertisements", body = AdvertisementListResponse),
        (status = 400, description = "Invalid query (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_advertisements(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<AdvertisementListQuery>,
) -> Result<Json<AdvertisementListResponse>, AppError> {
    let query = AdvertisementQuery::new(query.status, query.limit, query.offset);
    let ads = state.engine.list(query).await?;

    let data: Vec<AdvertisementResponse> = ads.into_iter().map(Into::into).collect();
    Ok(Json(AdvertisementListResponse {
        count: data.len(),
        data,
        limit: query.limit,
        offset: query.offset,
    }))
}

#[utoipa::path(
    get,
    path = "/active",
    tag = "Advertisements",
    operation_id = "listActiveAdvertisements",
    summary = "List advertisements eligible for display now",
    description = "Advertisements that are `active`, inside their display window (bounds inclusive) \
        and below their impression target. Read-only: a lapsed window does not change status.",
    responses(
        (status = 200, description = "Eligible advertisements", body = ActiveAdvertisementsResponse),
    ),
)]
#[instrument(skip(state))]
pub async fn list_active_advertisements(
    State(state): State<AppState>,
) -> Result<Json<ActiveAdvertisementsResponse>, AppError> {
    let ads = state.engine.list_active().await?;
    Ok(Json(ads.into()))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Advertisements",
    operation_id = "getAdvertisement",
    summary = "Get an advertisement by ID",
    params(("id" = i32, Path, description = "Advertisement ID")),
    responses(
        (status = 200, description = "Advertisement details", body = AdvertisementResponse),
        (status = 404, description = "Advertisement not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn get_advertisement(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<AdvertisementResponse>, AppError> {
    let ad = state.engine.get(id).await?;
    Ok(Json(ad.into()))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Advertisements",
    operation_id = "updateAdvertisement",
    summary = "Update an advertisement",
    description = "Partially updates an advertisement; only provided fields are modified. \
        `status` may be set to any value, including reopening a completed advertisement. \
        The time window is re-validated against the stored value of the field not supplied. \
        An empty payload returns the current resource unchanged.",
    params(("id" = i32, Path, description = "Advertisement ID")),
    request_body = UpdateAdvertisementRequest,
    responses(
        (status = 200, description = "Advertisement updated", body = AdvertisementResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Advertisement not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(id))]
pub async fn update_advertisement(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateAdvertisementRequest>,
) -> Result<Json<AdvertisementResponse>, AppError> {
    let changes = payload.into_changes()?;
    let ad = state.engine.update(id, changes).await?;
    Ok(Json(ad.into()))
}

#[utoipa::path(
    post,
    path = "/{id}/impression",
    tag = "Advertisements",
    operation_id = "recordImpression",
    summary = "Record one impression",
    description = "Atomically increments `current_impressions`; the advertisement becomes \
        `completed` once the target is reached. Only `active` advertisements accept \
        impressions (409 CONFLICT otherwise).",
    params(("id" = i32, Path, description = "Advertisement ID")),
    responses(
        (status = 200, description = "Updated advertisement", body = AdvertisementResponse),
        (status = 404, description = "Advertisement not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Advertisement not active (CONFLICT)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn record_impression(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<AdvertisementResponse>, AppError> {
    let current = state.engine.get(id).await?;
    if current.status != AdStatus::Active {
        return Err(AppError::Conflict(format!(
            "Advertisement {id} is {}, only active advertisements accept impressions",
            current.status
        )));
    }

    let ad = state.engine.record_impression(id).await?;
    Ok(Json(ad.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Advertisements",
    operation_id = "deleteAdvertisement",
    summary = "Delete an advertisement",
    description = "Deletes the record, then its stored image. A failure to remove the image is \
        logged and does not fail the request.",
    params(("id" = i32, Path, description = "Advertisement ID")),
    responses(
        (status = 204, description = "Advertisement deleted"),
        (status = 404, description = "Advertisement not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn delete_advertisement(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    let ad = state.engine.delete(id).await?;
    info!(image_path = %ad.image_path, "Advertisement removed");
    Ok(StatusCode::NO_CONTENT)
}
