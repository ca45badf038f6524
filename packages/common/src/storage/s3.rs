use async_trait::async_trait;
use ::s3::bucket::Bucket;
use ::s3::bucket_ops::BucketConfiguration;
use ::s3::creds::Credentials;
use ::s3::region::Region;

use super::error::StorageError;
use super::key::{new_object_key, validate_key};
use super::traits::{AssetStore, StoredAsset};
use crate::config::S3StorageConfig;
use tracing::info;

/// Asset store backed by an S3-compatible bucket.
pub struct S3AssetStore {
    bucket: Box<Bucket>,
    name: String,
    region: Region,
    credentials: Credentials,
    path_style: bool,
    public_base_url: String,
    max_size: u64,
}

impl S3AssetStore {
    pub fn new(config: &S3StorageConfig, max_size: u64) -> Result<Self, StorageError> {
        let region = match &config.endpoint {
            Some(endpoint) => Region::Custom {
                region: config.region.clone(),
                endpoint: endpoint.clone(),
            },
            None => config
                .region
                .parse()
                .map_err(|e| StorageError::Backend(format!("invalid region: {e}")))?,
        };

        let credentials = Credentials::new(
            config.access_key.as_deref(),
            config.secret_key.as_deref(),
            None,
            None,
            None,
        )
        .map_err(|e| StorageError::Backend(format!("invalid credentials: {e}")))?;

        let bucket = Bucket::new(&config.bucket, region.clone(), credentials.clone())
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        let bucket = if config.path_style {
            bucket.with_path_style()
        } else {
            bucket
        };

        let public_base_url = config
            .public_base_url
            .clone()
            .unwrap_or_else(|| bucket.url())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            bucket,
            name: config.bucket.clone(),
            region,
            credentials,
            path_style: config.path_style,
            public_base_url,
            max_size,
        })
    }

    /// Create the bucket with a public-read policy unless it already exists.
    ///
    /// Returns `true` when the bucket was created.
    pub async fn ensure_bucket(&self) -> Result<bool, StorageError> {
        let exists = self
            .bucket
            .exists()
            .await
            .map_err(|e| StorageError::Backend(format!("listing buckets failed: {e}")))?;
        if exists {
            return Ok(false);
        }

        let response = if self.path_style {
            Bucket::create_with_path_style(
                &self.name,
                self.region.clone(),
                self.credentials.clone(),
                BucketConfiguration::public(),
            )
            .await
        } else {
            Bucket::create(
                &self.name,
                self.region.clone(),
                self.credentials.clone(),
                BucketConfiguration::public(),
            )
            .await
        }
        .map_err(|e| StorageError::Backend(e.to_string()))?;

        let created = bucket_creation_outcome(response.response_code, &self.name)?;
        if created {
            info!(bucket = %self.name, "Created asset bucket");
        }
        Ok(created)
    }
}

/// `true` for a fresh bucket, `false` when another writer created it first.
fn bucket_creation_outcome(status: u16, bucket: &str) -> Result<bool, StorageError> {
    match status {
        200..=299 => Ok(true),
        // BucketAlreadyOwnedByYou
        409 => Ok(false),
        other => Err(StorageError::Backend(format!(
            "create bucket '{bucket}' returned HTTP {other}"
        ))),
    }
}

fn check_status(status: u16, key: &str, op: &str) -> Result<(), StorageError> {
    match status {
        200..=299 => Ok(()),
        404 => Err(StorageError::NotFound(key.to_string())),
        other => Err(StorageError::Backend(format!(
            "{op} '{key}' returned HTTP {other}"
        ))),
    }
}

#[async_trait]
impl AssetStore for S3AssetStore {
    async fn upload(&self, data: &[u8], content_type: &str) -> Result<StoredAsset, StorageError> {
        if data.len() as u64 > self.max_size {
            return Err(StorageError::SizeLimitExceeded {
                actual: data.len() as u64,
                limit: self.max_size,
            });
        }

        let key = new_object_key(content_type);
        let response = self
            .bucket
            .put_object_with_content_type(&key, data, content_type)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        check_status(response.status_code(), &key, "put")?;

        Ok(StoredAsset {
            public_url: format!("{}/{key}", self.public_base_url),
            storage_key: key,
        })
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let key = validate_key(key)?;
        let response = self
            .bucket
            .get_object(key)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        check_status(response.status_code(), key, "get")?;
        Ok(response.bytes().to_vec())
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let key = validate_key(key)?;
        let (_, status) = self
            .bucket
            .head_object(key)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        match check_status(status, key, "head") {
            Ok(()) => Ok(true),
            Err(StorageError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn delete(&self, key: &str) -> Result<bool, StorageError> {
        let key = validate_key(key)?;
        let response = self
            .bucket
            .delete_object(key)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        // S3 answers 204 for missing keys too.
        match check_status(response.status_code(), key, "delete") {
            Ok(()) => Ok(true),
            Err(StorageError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
