use async_trait::async_trait;

use super::error::ProviderError;
use super::model::{GenerateImageRequest, GeneratedImage};

/// Synchronous text-to-image generation.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    async fn generate(&self, request: &GenerateImageRequest)
    -> Result<GeneratedImage, ProviderError>;
}
