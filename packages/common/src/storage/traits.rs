use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::StorageError;

/// Location of an uploaded asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredAsset {
    /// URL clients use to fetch the asset.
    pub public_url: String,
    /// Opaque key used to address the asset inside the store.
    pub storage_key: String,
}

/// Binary asset storage for advertisement images.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Store bytes under a freshly generated key.
    async fn upload(&self, data: &[u8], content_type: &str) -> Result<StoredAsset, StorageError>;

    /// Retrieve all bytes for an asset.
    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Check whether an asset exists.
    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        match self.get(key).await {
            Ok(_) => Ok(true),
            Err(StorageError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Delete an asset.
    ///
    /// Returns `true` if the asset was deleted, `false` if it did not exist.
    async fn delete(&self, key: &str) -> Result<bool, StorageError>;
}
