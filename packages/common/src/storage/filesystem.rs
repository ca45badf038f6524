use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;

use super::error::StorageError;
use super::key::{new_object_key, validate_key};
use super::traits::{AssetStore, StoredAsset};

/// Filesystem-backed asset store.
///
/// Assets are written to `{base_path}/{key}` and advertised under
/// `{public_base_url}/{key}`.
pub struct FilesystemAssetStore {
    base_path: PathBuf,
    public_base_url: String,
    max_size: u64,
}

impl FilesystemAssetStore {
    /// Create a new filesystem asset store.
    pub async fn new(
        base_path: PathBuf,
        public_base_url: impl Into<String>,
        max_size: u64,
    ) -> Result<Self, StorageError> {
        fs::create_dir_all(&base_path).await?;
        fs::create_dir_all(base_path.join(".tmp")).await?;
        Ok(Self {
            base_path,
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
            max_size,
        })
    }

    fn asset_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        Ok(self.base_path.join(validate_key(key)?))
    }

    /// Path for a temporary file during writes.
    fn temp_path(&self) -> PathBuf {
        self.base_path
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{key}", self.public_base_url)
    }
}

#[async_trait]
impl AssetStore for FilesystemAssetStore {
    async fn upload(&self, data: &[u8], content_type: &str) -> Result<StoredAsset, StorageError> {
        if data.len() as u64 > self.max_size {
            return Err(StorageError::SizeLimitExceeded {
                actual: data.len() as u64,
                limit: self.max_size,
            });
        }

        let key = new_object_key(content_type);
        let asset_path = self.asset_path(&key)?;

        let temp_path = self.temp_path();
        if let Err(e) = fs::write(&temp_path, data).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        if let Some(parent) = asset_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        if let Err(e) = fs::rename(&temp_path, &asset_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        Ok(StoredAsset {
            public_url: self.public_url(&key),
            storage_key: key,
        })
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let asset_path = self.asset_path(key)?;
        match fs::read(&asset_path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let asset_path = self.asset_path(key)?;
        Ok(fs::try_exists(&asset_path).await?)
    }

    async fn delete(&self, key: &str) -> Result<bool, StorageError> {
        let asset_path = self.asset_path(key)?;
        match fs::remove_file(&asset_path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
