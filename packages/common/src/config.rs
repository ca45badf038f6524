use serde::Deserialize;

/// Which asset store backend the server writes images to.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Filesystem,
    S3,
}

/// Asset storage configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Default: filesystem.
    #[serde(default)]
    pub backend: StorageBackend,
    /// Maximum accepted image size in bytes. Default: 10 MiB.
    #[serde(default = "default_max_image_size")]
    pub max_image_size: u64,
    #[serde(default)]
    pub filesystem: FilesystemStorageConfig,
    #[serde(default)]
    pub s3: S3StorageConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FilesystemStorageConfig {
    /// Directory assets are written to. Default: "./data/assets".
    #[serde(default = "default_fs_root")]
    pub root: String,
    /// URL prefix the server exposes the directory under.
    #[serde(default = "default_fs_public_base_url")]
    pub public_base_url: String,
}

/// S3-compatible object storage (AWS, MinIO, Supabase Storage, ...).
#[derive(Debug, Deserialize, Clone)]
pub struct S3StorageConfig {
    /// Default: "advertisements".
    #[serde(default = "default_s3_bucket")]
    pub bucket: String,
    /// Default: "us-east-1".
    #[serde(default = "default_s3_region")]
    pub region: String,
    /// Custom endpoint for non-AWS providers.
    pub endpoint: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    /// Prefix for public URLs. Falls back to the bucket URL when unset.
    pub public_base_url: Option<String>,
    #[serde(default)]
    pub path_style: bool,
}

/// Text-to-image provider configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct ImageProviderConfig {
    /// Bearer token for the inference API.
    pub api_token: Option<String>,
    /// Default: "https://router.huggingface.co/hf-inference/models".
    #[serde(default = "default_image_base_url")]
    pub base_url: String,
    /// Request timeout. Default: 60.
    #[serde(default = "default_image_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_max_image_size() -> u64 {
    10 * 1024 * 1024
}
fn default_fs_root() -> String {
    "./data/assets".into()
}
fn default_fs_public_base_url() -> String {
    "http://127.0.0.1:7860/assets".into()
}
fn default_s3_bucket() -> String {
    "advertisements".into()
}
fn default_s3_region() -> String {
    "us-east-1".into()
}
fn default_image_base_url() -> String {
    "https://router.huggingface.co/hf-inference/models".into()
}
fn default_image_timeout_secs() -> u64 {
    60
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            max_image_size: default_max_image_size(),
            filesystem: FilesystemStorageConfig::default(),
            s3: S3StorageConfig::default(),
        }
    }
}

impl Default for FilesystemStorageConfig {
    fn default() -> Self {
        Self {
            root: default_fs_root(),
            public_base_url: default_fs_public_base_url(),
        }
    }
}

impl Default for S3StorageConfig {
    fn default() -> Self {
        Self {
            bucket: default_s3_bucket(),
            region: default_s3_region(),
            endpoint: None,
            access_key: None,
            secret_key: None,
            public_base_url: None,
            path_style: false,
        }
    }
}

impl Default for ImageProviderConfig {
    fn default() -> Self {
        Self {
            api_token: None,
            base_url: default_image_base_url(),
            timeout_secs: default_image_timeout_secs(),
        }
    }
}
