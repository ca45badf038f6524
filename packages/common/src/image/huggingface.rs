use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, header};
use serde_json::json;
use tracing::{debug, instrument, warn};

use super::error::ProviderError;
use super::model::{GenerateImageRequest, GeneratedImage};
use super::traits::ImageProvider;
use crate::config::ImageProviderConfig;

const DEFAULT_CONTENT_TYPE: &str = "image/png";

/// Hugging Face serverless inference client.
pub struct HuggingFaceProvider {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HuggingFaceProvider {
    pub fn new(config: &ImageProviderConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(ProviderError::Request)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.api_token.clone().filter(|t| !t.is_empty()),
        })
    }

    fn endpoint(&self, request: &GenerateImageRequest) -> String {
        format!("{}/{}", self.base_url, request.model.provider_model())
    }
}

#[async_trait]
impl ImageProvider for HuggingFaceProvider {
    #[instrument(skip(self, request), fields(model = %request.model))]
    async fn generate(
        &self,
        request: &GenerateImageRequest,
    ) -> Result<GeneratedImage, ProviderError> {
        let token = self.token.as_deref().ok_or(ProviderError::MissingToken)?;

        let mut payload = json!({ "inputs": request.prompt });
        if let Some(ref negative) = request.negative_prompt {
            payload["negative_prompt"] = json!(negative);
        }

        let response = self
            .client
            .post(self.endpoint(request))
            .bearer_auth(token)
            .json(&payload)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {
                let content_type = response
                    .headers()
                    .get(header::CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .filter(|ct| ct.starts_with("image/"))
                    .unwrap_or(DEFAULT_CONTENT_TYPE)
                    .to_string();
                let bytes = response.bytes().await?.to_vec();
                debug!(size = bytes.len(), %content_type, "Image generated");
                Ok(GeneratedImage {
                    bytes,
                    content_type,
                    model: request.model,
                })
            }
            StatusCode::SERVICE_UNAVAILABLE => {
                warn!("Model is loading on the provider");
                Err(ProviderError::ModelLoading)
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(ProviderError::Http {
                    status: status.as_u16(),
                    body,
                })
            }
        }
    }
}
