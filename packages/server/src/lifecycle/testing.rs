//! In-memory collaborators for engine tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::AdStatus;
use common::image::{
    GenerateImageRequest, GeneratedImage, ImageModel, ImageProvider, ProviderError,
};
use common::storage::{AssetStore, StorageError, StoredAsset, new_object_key};
use sea_orm::DbErr;

use super::error::{LifecycleError, StoreError};
use super::models::{Advertisement, AdvertisementChanges, NewAdvertisement};
use super::store::{AdvertisementStore, Page};

#[derive(Default)]
pub(crate) struct MemoryAdvertisementStore {
    rows: Mutex<BTreeMap<i32, Advertisement>>,
    next_id: Mutex<i32>,
    fail_inserts: AtomicBool,
}

impl MemoryAdvertisementStore {
    pub fn fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.lock().unwrap().is_empty()
    }
}

#[async_trait]
impl AdvertisementStore for MemoryAdvertisementStore {
    async fn insert(&self, record: NewAdvertisement) -> Result<Advertisement, StoreError> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(DbErr::Custom("insert rejected".into()).into());
        }
        let id = {
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            *next
        };
        let ad = Advertisement {
            id,
            image_url: record.image_url,
            image_path: record.image_path,
            description: record.description,
            start_time: record.start_time,
            end_time: record.end_time,
            impression_count: record.impression_count,
            current_impressions: record.current_impressions,
            status: record.status,
            created_at: record.created_at,
            updated_at: None,
        };
        self.rows.lock().unwrap().insert(id, ad.clone());
        Ok(ad)
    }

    async fn get(&self, id: i32) -> Result<Option<Advertisement>, StoreError> {
        Ok(self.rows.lock().unwrap().get(&id).cloned())
    }

    async fn list(
        &self,
        status: Option<AdStatus>,
        page: Option<Page>,
    ) -> Result<Vec<Advertisement>, StoreError> {
        let rows = self.rows.lock().unwrap();
        let matching = rows
            .values()
            .filter(|ad| status.is_none_or(|s| ad.status == s))
            .cloned();
        Ok(match page {
            Some(page) => matching
                .skip(page.offset as usize)
                .take(page.limit as usize)
                .collect(),
            None => matching.collect(),
        })
    }

    async fn list_eligible(&self, now: DateTime<Utc>) -> Result<Vec<Advertisement>, StoreError> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .values()
            .filter(|ad| ad.is_eligible_at(now))
            .cloned()
            .collect())
    }

    async fn increment_impressions(
        &self,
        id: i32,
        at: DateTime<Utc>,
    ) -> Result<Option<Advertisement>, StoreError> {
        let mut rows = self.rows.lock().unwrap();
        Ok(rows.get_mut(&id).map(|ad| {
            ad.apply_impression(at);
            ad.clone()
        }))
    }

    async fn update(
        &self,
        id: i32,
        changes: &AdvertisementChanges,
        at: DateTime<Utc>,
    ) -> Result<Option<Advertisement>, LifecycleError> {
        let mut rows = self.rows.lock().unwrap();
        let Some(ad) = rows.get_mut(&id) else {
            return Ok(None);
        };
        changes.validate_against(ad)?;

        if let Some(ref description) = changes.description {
            ad.description = description.clone();
        }
        if let Some(start_time) = changes.start_time {
            ad.start_time = start_time;
        }
        if let Some(end_time) = changes.end_time {
            ad.end_time = end_time;
        }
        if let Some(count) = changes.impression_count {
            ad.impression_count = count;
        }
        if let Some(status) = changes.status {
            ad.status = status;
        }
        ad.updated_at = Some(at);
        Ok(Some(ad.clone()))
    }

    async fn delete(&self, id: i32) -> Result<bool, StoreError> {
        Ok(self.rows.lock().unwrap().remove(&id).is_some())
    }
}

#[derive(Default)]
pub(crate) struct MemoryAssetStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    deleted: Mutex<Vec<String>>,
    fail_deletes: AtomicBool,
}

impl MemoryAssetStore {
    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl AssetStore for MemoryAssetStore {
    async fn upload(&self, data: &[u8], content_type: &str) -> Result<StoredAsset, StorageError> {
        let key = new_object_key(content_type);
        self.objects
            .lock()
            .unwrap()
            .insert(key.clone(), data.to_vec());
        Ok(StoredAsset {
            public_url: format!("memory://assets/{key}"),
            storage_key: key,
        })
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn delete(&self, key: &str) -> Result<bool, StorageError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StorageError::Backend("delete rejected".into()));
        }
        let removed = self.objects.lock().unwrap().remove(key).is_some();
        if removed {
            self.deleted.lock().unwrap().push(key.to_string());
        }
        Ok(removed)
    }
}

type ErrorFactory = Box<dyn Fn() -> ProviderError + Send + Sync>;

pub(crate) struct StubImageProvider {
    outcome: Result<(Vec<u8>, String), ErrorFactory>,
    calls: Mutex<Vec<(String, ImageModel)>>,
}

impl StubImageProvider {
    pub fn ok(bytes: Vec<u8>, content_type: &str) -> Self {
        Self {
            outcome: Ok((bytes, content_type.to_string())),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(make_error: impl Fn() -> ProviderError + Send + Sync + 'static) -> Self {
        Self {
            outcome: Err(Box::new(make_error)),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(String, ImageModel)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageProvider for StubImageProvider {
    async fn generate(
        &self,
        request: &GenerateImageRequest,
    ) -> Result<GeneratedImage, ProviderError> {
        self.calls
            .lock()
            .unwrap()
            .push((request.prompt.clone(), request.model));
        match self.outcome {
            Ok((ref bytes, ref content_type)) => Ok(GeneratedImage {
                bytes: bytes.clone(),
                content_type: content_type.clone(),
                model: request.model,
            }),
            Err(ref make_error) => Err(make_error()),
        }
    }
}
