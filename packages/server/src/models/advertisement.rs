use chrono::{DateTime, FixedOffset, Utc};
use common::AdStatus;
use common::image::GenerateImageRequest;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::shared::{parse_optional_timestamp, parse_timestamp};
use crate::error::AppError;
use crate::lifecycle::{Advertisement, AdvertisementChanges, AdvertisementDraft};

/// Response DTO for a single advertisement.
#[derive(Serialize, ToSchema)]
pub struct AdvertisementResponse {
    #[schema(example = 1)]
    pub id: i32,
    /// Public URL of the creative.
    #[schema(example = "http://127.0.0.1:7860/assets/advertisements/2b0c1d52-9f0e-4f53-a1c5-8f1b0e6f6a10.png")]
    pub image_url: String,
    /// Storage key of the creative.
    #[schema(example = "advertisements/2b0c1d52-9f0e-4f53-a1c5-8f1b0e6f6a10.png")]
    pub image_path: String,
    #[schema(example = "Spring sale: 20% off all bikes")]
    pub description: String,
    #[schema(value_type = String, format = DateTime, example = "2024-01-01T00:00:00Z")]
    pub start_time: DateTime<FixedOffset>,
    #[schema(value_type = String, format = DateTime, example = "2024-01-31T23:59:59Z")]
    pub end_time: DateTime<FixedOffset>,
    /// Target number of impressions.
    #[schema(example = 1000)]
    pub impression_count: i32,
    #[schema(example = 0)]
    pub current_impressions: i32,
    pub status: AdStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<Advertisement> for AdvertisementResponse {
    fn from(ad: Advertisement) -> Self {
        Self {
            id: ad.id,
            image_url: ad.image_url,
            image_path: ad.image_path,
            description: ad.description,
            start_time: ad.start_time,
            end_time: ad.end_time,
            impression_count: ad.impression_count,
            current_impressions: ad.current_impressions,
            status: ad.status,
            created_at: ad.created_at,
            updated_at: ad.updated_at,
        }
    }
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AdvertisementListQuery {
    /// Only return advertisements with this status.
    pub status: Option<AdStatus>,
    /// Page size, 1-1000. Default: 100.
    pub limit: Option<u64>,
    /// Number of records to skip. Default: 0.
    pub offset: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct AdvertisementListResponse {
    pub data: Vec<AdvertisementResponse>,
    /// Number of records in `data`.
    pub count: usize,
    pub limit: u64,
    pub offset: u64,
}

/// Advertisements eligible for display now.
#[derive(Serialize, ToSchema)]
pub struct ActiveAdvertisementsResponse {
    pub data: Vec<AdvertisementResponse>,
    pub count: usize,
}

impl From<Vec<Advertisement>> for ActiveAdvertisementsResponse {
    fn from(ads: Vec<Advertisement>) -> Self {
        let data: Vec<AdvertisementResponse> = ads.into_iter().map(Into::into).collect();
        Self {
            count: data.len(),
            data,
        }
    }
}

/// PATCH body. Absent fields are left unchanged.
#[derive(Deserialize, Default, PartialEq, ToSchema)]
pub struct UpdateAdvertisementRequest {
    pub description: Option<String>,
    #[schema(example = "2024-02-01T00:00:00Z")]
    pub start_time: Option<String>,
    #[schema(example = "2024-02-29T23:59:59Z")]
    pub end_time: Option<String>,
    pub impression_count: Option<i32>,
    pub status: Option<AdStatus>,
}

impl UpdateAdvertisementRequest {
    pub fn into_changes(self) -> Result<AdvertisementChanges, AppError> {
        Ok(AdvertisementChanges {
            start_time: parse_optional_timestamp("start_time", self.start_time.as_deref())?,
            end_time: parse_optional_timestamp("end_time", self.end_time.as_deref())?,
            description: self.description,
            impression_count: self.impression_count,
            status: self.status,
        })
    }
}

/// Create an advertisement whose creative is generated from a prompt.
#[derive(Deserialize, ToSchema)]
pub struct GenerateAdvertisementRequest {
    /// Text prompt for the image model.
    #[schema(example = "A minimalist poster of a red bicycle, studio lighting")]
    pub prompt: String,
    /// Model id; see `GET /images/models`. Default: `flux-schnell`.
    #[schema(example = "flux-schnell")]
    pub model: Option<String>,
    pub negative_prompt: Option<String>,
    pub description: String,
    #[schema(example = "2024-01-01T00:00:00Z")]
    pub start_time: String,
    #[schema(example = "2024-01-31T23:59:59Z")]
    pub end_time: String,
    #[schema(example = 1000)]
    pub impression_count: i32,
}

impl GenerateAdvertisementRequest {
    pub fn into_parts(self) -> Result<(AdvertisementDraft, GenerateImageRequest), AppError> {
        let request = GenerateImageRequest::new(
            &self.prompt,
            self.model.as_deref(),
            self.negative_prompt.as_deref(),
        )?;
        let draft = AdvertisementDraft {
            start_time: parse_timestamp("start_time", &self.start_time)?,
            end_time: parse_timestamp("end_time", &self.end_time)?,
            description: self.description,
            impression_count: self.impression_count,
        };
        Ok((draft, request))
    }
}

/// Text fields of the multipart create form, as received.
#[derive(Default)]
pub struct CreateAdvertisementFields {
    pub description: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub impression_count: Option<String>,
}

impl CreateAdvertisementFields {
    pub fn into_draft(self) -> Result<AdvertisementDraft, AppError> {
        let description = require(self.description, "description")?;
        let start_time = require(self.start_time, "start_time")?;
        let end_time = require(self.end_time, "end_time")?;
        let impression_count = require(self.impression_count, "impression_count")?;

        let impression_count = impression_count.trim().parse::<i32>().map_err(|_| {
            AppError::Validation(format!(
                "impression_count must be an integer, got '{impression_count}'"
            ))
        })?;

        Ok(AdvertisementDraft {
            description,
            start_time: parse_timestamp("start_time", &start_time)?,
            end_time: parse_timestamp("end_time", &end_time)?,
            impression_count,
        })
    }
}

fn require(value: Option<String>, field: &str) -> Result<String, AppError> {
    value.ok_or_else(|| AppError::Validation(format!("Missing '{field}' field")))
}
