use common::image::{GenerateImageRequest, ImageModel};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;

#[derive(Serialize, ToSchema)]
pub struct ImageModelInfo {
    /// Identifier accepted in generation requests.
    #[schema(example = "flux-schnell")]
    pub id: &'static str,
    #[schema(example = "FLUX.1 Schnell")]
    pub name: &'static str,
    pub description: &'static str,
    pub recommended: bool,
}

impl From<ImageModel> for ImageModelInfo {
    fn from(model: ImageModel) -> Self {
        Self {
            id: model.id(),
            name: model.display_name(),
            description: model.description(),
            recommended: model.is_recommended(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ImageModelsResponse {
    pub models: Vec<ImageModelInfo>,
    /// Model used when a request names none.
    #[schema(example = "flux-schnell")]
    pub default: &'static str,
}

impl ImageModelsResponse {
    pub fn available() -> Self {
        Self {
            models: ImageModel::ALL.iter().copied().map(Into::into).collect(),
            default: ImageModel::default().id(),
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct GenerateImageBody {
    #[schema(example = "A minimalist poster of a red bicycle, studio lighting")]
    pub prompt: String,
    #[schema(example = "sdxl")]
    pub model: Option<String>,
    #[schema(example = "blurry, low quality")]
    pub negative_prompt: Option<String>,
}

impl TryFrom<GenerateImageBody> for GenerateImageRequest {
    type Error = AppError;

    fn try_from(body: GenerateImageBody) -> Result<Self, Self::Error> {
        Ok(GenerateImageRequest::new(
            &body.prompt,
            body.model.as_deref(),
            body.negative_prompt.as_deref(),
        )?)
    }
}
