mod error;
mod model;
mod traits;

pub mod huggingface;

pub use error::ProviderError;
pub use model::{GenerateImageRequest, GeneratedImage, ImageModel};
pub use traits::ImageProvider;
