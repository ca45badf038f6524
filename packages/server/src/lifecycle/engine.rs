use std::sync::Arc;

use chrono::{DateTime, Utc};
use common::AdStatus;
use common::image::{GenerateImageRequest, ImageProvider};
use common::storage::{AssetStore, StoredAsset};
use tracing::{error, info, instrument, warn};

use super::error::LifecycleError;
use super::models::{Advertisement, AdvertisementChanges, AdvertisementDraft, AdvertisementQuery};
use super::store::{AdvertisementStore, Page};

/// Deletes an uploaded asset if dropped before [`defuse`](Self::defuse).
///
/// Covers the window between upload and record insert when the surrounding
/// future is cancelled. Explicit failure paths clean up themselves and defuse.
pub struct AssetCleanupGuard {
    assets: Arc<dyn AssetStore>,
    storage_key: String,
    defused: bool,
}

impl AssetCleanupGuard {
    pub fn new(assets: Arc<dyn AssetStore>, storage_key: impl Into<String>) -> Self {
        Self {
            assets,
            storage_key: storage_key.into(),
            defused: false,
        }
    }

    pub fn defuse(&mut self) {
        self.defused = true;
    }
}

impl Drop for AssetCleanupGuard {
    fn drop(&mut self) {
        if self.defused {
            return;
        }
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            error!(storage_key = %self.storage_key, "No runtime to remove orphaned asset");
            return;
        };
        let assets = Arc::clone(&self.assets);
        let key = std::mem::take(&mut self.storage_key);
        handle.spawn(async move {
            warn!(storage_key = %key, "Creation abandoned, removing uploaded asset");
            if let Err(e) = assets.delete(&key).await {
                error!(storage_key = %key, error = %e, "Failed to remove orphaned asset");
            }
        });
    }
}

/// Advertisement state machine, impression protocol and eligibility view.
///
/// Holds no mutable state of its own; every read and write goes through the
/// injected stores.
#[derive(Clone)]
pub struct LifecycleEngine {
    store: Arc<dyn AdvertisementStore>,
    assets: Arc<dyn AssetStore>,
}

impl LifecycleEngine {
    pub fn new(store: Arc<dyn AdvertisementStore>, assets: Arc<dyn AssetStore>) -> Self {
        Self { store, assets }
    }

    /// Record phase of creation: persist `draft` against an already uploaded
    /// asset. The asset is deleted again if validation or the insert fails.
    #[instrument(skip(self, draft, asset), fields(storage_key = %asset.storage_key))]
    pub async fn create(
        &self,
        draft: AdvertisementDraft,
        asset: StoredAsset,
    ) -> Result<Advertisement, LifecycleError> {
        let storage_key = asset.storage_key.clone();
        let mut guard = AssetCleanupGuard::new(Arc::clone(&self.assets), storage_key.clone());

        let result = self.insert_record(draft, asset).await;
        if let Err(ref e) = result {
            warn!(error = %e, "Creation failed, removing uploaded asset");
            self.discard_asset(&storage_key).await;
        }
        guard.defuse();

        if let Ok(ref ad) = result {
            info!(id = ad.id, "Advertisement created");
        }
        result
    }

    async fn insert_record(
        &self,
        draft: AdvertisementDraft,
        asset: StoredAsset,
    ) -> Result<Advertisement, LifecycleError> {
        draft.validate()?;
        let record = draft.into_record(asset, Utc::now());
        Ok(self.store.insert(record).await?)
    }

    /// Both phases of creation: upload `bytes`, then insert the record.
    ///
    /// The draft is validated before anything is uploaded.
    pub async fn create_with_image(
        &self,
        draft: AdvertisementDraft,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<Advertisement, LifecycleError> {
        draft.validate()?;
        if !content_type.starts_with("image/") {
            return Err(LifecycleError::validation(
                "image",
                format!("content type must be image/*, got '{content_type}'"),
            ));
        }
        if bytes.is_empty() {
            return Err(LifecycleError::validation("image", "file is empty"));
        }

        let asset = self.assets.upload(bytes, content_type).await?;
        self.create(draft, asset).await
    }

    /// Generate the creative with `provider`, then create as
    /// [`create_with_image`](Self::create_with_image) does.
    #[instrument(skip(self, draft, provider, request), fields(model = %request.model))]
    pub async fn create_from_generated(
        &self,
        draft: AdvertisementDraft,
        provider: &dyn ImageProvider,
        request: &GenerateImageRequest,
    ) -> Result<Advertisement, LifecycleError> {
        draft.validate()?;
        let image = provider.generate(request).await?;
        self.create_with_image(draft, &image.bytes, &image.content_type)
            .await
    }

    pub async fn get(&self, id: i32) -> Result<Advertisement, LifecycleError> {
        self.store
            .get(id)
            .await?
            .ok_or(LifecycleError::NotFound(id))
    }

    pub async fn list(&self, query: AdvertisementQuery) -> Result<Vec<Advertisement>, LifecycleError> {
        let page = Page {
            limit: query.limit,
            offset: query.offset,
        };
        Ok(self.store.list(query.status, Some(page)).await?)
    }

    /// Advertisements eligible for display right now.
    pub async fn list_active(&self) -> Result<Vec<Advertisement>, LifecycleError> {
        self.list_active_at(Utc::now()).await
    }

    /// Eligibility view at a fixed instant. Performs no writes: a lapsed window
    /// excludes a record without changing its status.
    pub async fn list_active_at(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<Advertisement>, LifecycleError> {
        Ok(self.store.list_eligible(now).await?)
    }

    /// Apply a partial update validated against the merged record.
    ///
    /// The store repeats the validation against the locked row, so a
    /// concurrent edit cannot leave `start_time >= end_time` behind.
    /// An empty change set returns the stored record untouched.
    #[instrument(skip(self, changes))]
    pub async fn update(
        &self,
        id: i32,
        changes: AdvertisementChanges,
    ) -> Result<Advertisement, LifecycleError> {
        let existing = self.get(id).await?;
        if changes.is_empty() {
            return Ok(existing);
        }
        changes.validate_against(&existing)?;

        let changes = changes.normalized();
        let updated = self
            .store
            .update(id, &changes, Utc::now())
            .await?
            .ok_or(LifecycleError::NotFound(id))?;

        if updated.status != existing.status {
            info!(from = %existing.status, to = %updated.status, "Status changed");
        }
        Ok(updated)
    }

    pub async fn record_impression(&self, id: i32) -> Result<Advertisement, LifecycleError> {
        self.record_impression_at(id, Utc::now()).await
    }

    /// Count one impression atomically. Completion is applied whatever the
    /// prior status; gating on `active` is the caller's concern.
    #[instrument(skip(self))]
    pub async fn record_impression_at(
        &self,
        id: i32,
        at: DateTime<Utc>,
    ) -> Result<Advertisement, LifecycleError> {
        let ad = self
            .store
            .increment_impressions(id, at)
            .await?
            .ok_or(LifecycleError::NotFound(id))?;

        if ad.status == AdStatus::Completed && ad.current_impressions == ad.impression_count {
            info!(
                impressions = ad.current_impressions,
                "Impression target reached, advertisement completed"
            );
        }
        Ok(ad)
    }

    /// Remove the record, then its asset. Asset removal failures are logged
    /// and do not undo the record deletion.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<Advertisement, LifecycleError> {
        let existing = self.get(id).await?;
        if !self.store.delete(id).await? {
            return Err(LifecycleError::NotFound(id));
        }
        info!("Advertisement deleted");
        self.discard_asset(&existing.image_path).await;
        Ok(existing)
    }

    async fn discard_asset(&self, storage_key: &str) {
        match self.assets.delete(storage_key).await {
            Ok(true) => {}
            Ok(false) => warn!(%storage_key, "Asset was already absent"),
            Err(e) => error!(%storage_key, error = %e, "Failed to delete asset"),
        }
    }
}
