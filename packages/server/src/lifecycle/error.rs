use common::image::ProviderError;
use common::storage::StorageError;
use sea_orm::DbErr;
use thiserror::Error;

/// Failure of the entity or asset store underneath the engine.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("Asset storage error: {0}")]
    Asset(#[from] StorageError),
}

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("Advertisement {0} not found")]
    NotFound(i32),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl LifecycleError {
    pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }
}

impl From<DbErr> for LifecycleError {
    fn from(err: DbErr) -> Self {
        Self::Store(StoreError::Database(err))
    }
}

impl From<StorageError> for LifecycleError {
    fn from(err: StorageError) -> Self {
        Self::Store(StoreError::Asset(err))
    }
}
