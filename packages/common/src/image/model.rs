use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::ProviderError;

/// Text-to-image models the provider adapter knows how to call.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema,
)]
pub enum ImageModel {
    /// FLUX.1 Schnell: fast with good quality.
    #[default]
    #[serde(rename = "flux-schnell")]
    FluxSchnell,
    /// Stable Diffusion XL.
    #[serde(rename = "sdxl")]
    Sdxl,
    /// Stable Diffusion 1.5.
    #[serde(rename = "sd-1.5")]
    Sd15,
}

impl ImageModel {
    pub const ALL: &'static [ImageModel] = &[Self::FluxSchnell, Self::Sdxl, Self::Sd15];

    /// Public identifier used in API requests.
    pub fn id(&self) -> &'static str {
        match self {
            Self::FluxSchnell => "flux-schnell",
            Self::Sdxl => "sdxl",
            Self::Sd15 => "sd-1.5",
        }
    }

    /// Model path on the inference provider.
    pub fn provider_model(&self) -> &'static str {
        match self {
            Self::FluxSchnell => "black-forest-labs/FLUX.1-schnell",
            Self::Sdxl => "stabilityai/stable-diffusion-xl-base-1.0",
            Self::Sd15 => "runwayml/stable-diffusion-v1-5",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::FluxSchnell => "FLUX.1 Schnell",
            Self::Sdxl => "Stable Diffusion XL",
            Self::Sd15 => "Stable Diffusion 1.5",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::FluxSchnell => "Fast with excellent quality, recommended",
            Self::Sdxl => "High quality image generation",
            Self::Sd15 => "Classic model",
        }
    }

    pub fn is_recommended(&self) -> bool {
        *self == Self::default()
    }

    pub fn ids() -> Vec<&'static str> {
        Self::ALL.iter().map(|m| m.id()).collect()
    }
}

impl fmt::Display for ImageModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ImageModel {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.id() == s)
            .ok_or_else(|| ProviderError::UnknownModel(s.to_string()))
    }
}

/// A validated generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateImageRequest {
    pub prompt: String,
    pub model: ImageModel,
    pub negative_prompt: Option<String>,
}

impl GenerateImageRequest {
    /// Validate raw inputs. Fails before any network traffic on an empty
    /// prompt or an unrecognized model id; `None` selects the default model.
    pub fn new(
        prompt: &str,
        model_id: Option<&str>,
        negative_prompt: Option<&str>,
    ) -> Result<Self, ProviderError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(ProviderError::EmptyPrompt);
        }
        let model = match model_id {
            Some(id) => id.parse()?,
            None => ImageModel::default(),
        };
        let negative_prompt = negative_prompt
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Ok(Self {
            prompt: prompt.to_string(),
            model,
            negative_prompt,
        })
    }
}

/// Raw image returned by a provider.
#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub model: ImageModel,
}
