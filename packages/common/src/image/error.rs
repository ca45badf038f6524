use thiserror::Error;

use super::model::ImageModel;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Unsupported model '{0}', available models: {models}", models = ImageModel::ids().join(", "))]
    UnknownModel(String),

    #[error("Prompt must not be empty")]
    EmptyPrompt,

    #[error("Image provider token is not configured")]
    MissingToken,

    #[error("Model is still loading, retry in 20-30 seconds")]
    ModelLoading,

    #[error("Image generation timed out")]
    Timeout,

    #[error("Image generation failed (HTTP {status}): {body}")]
    Http { status: u16, body: String },

    #[error("Image provider request failed: {0}")]
    Request(#[source] reqwest::Error),
}

impl ProviderError {
    /// True for rejections caused by the caller's input rather than the provider.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::UnknownModel(_) | Self::EmptyPrompt)
    }

    /// True when retrying the same request later is expected to succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ModelLoading | Self::Timeout)
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Request(err)
        }
    }
}
