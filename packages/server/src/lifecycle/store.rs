use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::AdStatus;

use super::error::{LifecycleError, StoreError};
use super::models::{Advertisement, AdvertisementChanges, NewAdvertisement};

/// Limit/offset window over an ordered listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: u64,
    pub offset: u64,
}

/// Durable storage for advertisement records.
///
/// Listings are ordered by ascending `id` so that offset pagination is stable.
#[async_trait]
pub trait AdvertisementStore: Send + Sync {
    /// Persist a new record and return it with its assigned id.
    async fn insert(&self, record: NewAdvertisement) -> Result<Advertisement, StoreError>;

    async fn get(&self, id: i32) -> Result<Option<Advertisement>, StoreError>;

    /// List records, optionally by status. `None` returns every match.
    async fn list(
        &self,
        status: Option<AdStatus>,
        page: Option<Page>,
    ) -> Result<Vec<Advertisement>, StoreError>;

    /// Records eligible for display at `now`: `active`, inside the window
    /// (bounds inclusive) and below their impression target. Ordered by id.
    async fn list_eligible(&self, now: DateTime<Utc>) -> Result<Vec<Advertisement>, StoreError>;

    /// Atomically add one impression and apply the completion transition
    /// (see [`Advertisement::apply_impression`]). No lost updates under
    /// concurrent calls for the same id.
    async fn increment_impressions(
        &self,
        id: i32,
        at: DateTime<Utc>,
    ) -> Result<Option<Advertisement>, StoreError>;

    /// Apply the supplied fields and stamp `updated_at`.
    ///
    /// `changes` are validated against the row as it stands when the write is
    /// applied, with the row locked for the duration. A violation leaves the
    /// record untouched and is returned as [`LifecycleError::Validation`].
    async fn update(
        &self,
        id: i32,
        changes: &AdvertisementChanges,
        at: DateTime<Utc>,
    ) -> Result<Option<Advertisement>, LifecycleError>;

    /// Returns `false` if the record did not exist.
    async fn delete(&self, id: i32) -> Result<bool, StoreError>;
}
