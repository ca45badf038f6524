mod error;
mod key;
mod traits;

pub mod filesystem;
#[cfg(feature = "object-storage")]
pub mod s3;

pub use error::StorageError;
pub use key::{KEY_PREFIX, extension_for, new_object_key, validate_key};
pub use traits::{AssetStore, StoredAsset};
