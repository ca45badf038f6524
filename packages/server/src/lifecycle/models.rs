use chrono::{DateTime, FixedOffset, Utc};
use common::AdStatus;
use common::storage::StoredAsset;

use super::error::LifecycleError;
use crate::entity::advertisement;

pub const DEFAULT_LIST_LIMIT: u64 = 100;
pub const MAX_LIST_LIMIT: u64 = 1000;

/// An advertisement record as seen by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advertisement {
    pub id: i32,
    pub image_url: String,
    pub image_path: String,
    pub description: String,
    pub start_time: DateTime<FixedOffset>,
    pub end_time: DateTime<FixedOffset>,
    pub impression_count: i32,
    pub current_impressions: i32,
    pub status: AdStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Advertisement {
    /// Whether the advertisement may be displayed at `now`.
    ///
    /// Requires `active` status, `start_time <= now <= end_time` and
    /// remaining impression headroom. Offsets are normalized before comparing.
    pub fn is_eligible_at(&self, now: DateTime<Utc>) -> bool {
        self.status == AdStatus::Active
            && self.start_time.with_timezone(&Utc) <= now
            && now <= self.end_time.with_timezone(&Utc)
            && self.current_impressions < self.impression_count
    }

    /// Count one impression and apply the completion transition.
    ///
    /// Completion is checked regardless of the prior status. Stores must apply
    /// this as a single atomic step.
    pub fn apply_impression(&mut self, at: DateTime<Utc>) {
        self.current_impressions += 1;
        if self.current_impressions >= self.impression_count {
            self.status = AdStatus::Completed;
        }
        self.updated_at = Some(at);
    }

    pub fn remaining_impressions(&self) -> i32 {
        (self.impression_count - self.current_impressions).max(0)
    }
}

impl From<advertisement::Model> for Advertisement {
    fn from(m: advertisement::Model) -> Self {
        Self {
            id: m.id,
            image_url: m.image_url,
            image_path: m.image_path,
            description: m.description,
            start_time: m.start_time,
            end_time: m.end_time,
            impression_count: m.impression_count,
            current_impressions: m.current_impressions,
            status: m.status,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// Caller-supplied fields for a new advertisement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvertisementDraft {
    pub description: String,
    pub start_time: DateTime<FixedOffset>,
    pub end_time: DateTime<FixedOffset>,
    pub impression_count: i32,
}

impl AdvertisementDraft {
    pub fn validate(&self) -> Result<(), LifecycleError> {
        validate_description(&self.description)?;
        validate_window(self.start_time, self.end_time)?;
        validate_impression_count(self.impression_count)
    }

    pub(crate) fn into_record(self, asset: StoredAsset, now: DateTime<Utc>) -> NewAdvertisement {
        NewAdvertisement {
            image_url: asset.public_url,
            image_path: asset.storage_key,
            description: self.description.trim().to_string(),
            start_time: self.start_time,
            end_time: self.end_time,
            impression_count: self.impression_count,
            current_impressions: 0,
            status: AdStatus::Active,
            created_at: now,
        }
    }
}

/// A fully populated record ready for insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAdvertisement {
    pub image_url: String,
    pub image_path: String,
    pub description: String,
    pub start_time: DateTime<FixedOffset>,
    pub end_time: DateTime<FixedOffset>,
    pub impression_count: i32,
    pub current_impressions: i32,
    pub status: AdStatus,
    pub created_at: DateTime<Utc>,
}

/// Partial update. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdvertisementChanges {
    pub description: Option<String>,
    pub start_time: Option<DateTime<FixedOffset>>,
    pub end_time: Option<DateTime<FixedOffset>>,
    pub impression_count: Option<i32>,
    pub status: Option<AdStatus>,
}

impl AdvertisementChanges {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Validate the supplied fields merged over `existing`.
    pub fn validate_against(&self, existing: &Advertisement) -> Result<(), LifecycleError> {
        if let Some(ref description) = self.description {
            validate_description(description)?;
        }
        if let Some(count) = self.impression_count {
            validate_impression_count(count)?;
        }
        if self.start_time.is_some() || self.end_time.is_some() {
            validate_window(
                self.start_time.unwrap_or(existing.start_time),
                self.end_time.unwrap_or(existing.end_time),
            )?;
        }
        Ok(())
    }

    pub(crate) fn normalized(mut self) -> Self {
        self.description = self.description.map(|d| d.trim().to_string());
        self
    }
}

/// Filtered, paginated listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvertisementQuery {
    pub status: Option<AdStatus>,
    pub limit: u64,
    pub offset: u64,
}

impl AdvertisementQuery {
    /// Apply the default limit and clamp it to `1..=MAX_LIST_LIMIT`.
    pub fn new(status: Option<AdStatus>, limit: Option<u64>, offset: Option<u64>) -> Self {
        Self {
            status,
            limit: limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT),
            offset: offset.unwrap_or(0),
        }
    }
}

impl Default for AdvertisementQuery {
    fn default() -> Self {
        Self::new(None, None, None)
    }
}

fn validate_description(description: &str) -> Result<(), LifecycleError> {
    if description.trim().is_empty() {
        return Err(LifecycleError::validation(
            "description",
            "must not be empty",
        ));
    }
    Ok(())
}

fn validate_window(
    start: DateTime<FixedOffset>,
    end: DateTime<FixedOffset>,
) -> Result<(), LifecycleError> {
    if start.with_timezone(&Utc) >= end.with_timezone(&Utc) {
        return Err(LifecycleError::validation(
            "end_time",
            format!("end_time ({end}) must be later than start_time ({start})"),
        ));
    }
    Ok(())
}

fn validate_impression_count(count: i32) -> Result<(), LifecycleError> {
    if count < 1 {
        return Err(LifecycleError::validation(
            "impression_count",
            format!("must be at least 1, got {count}"),
        ));
    }
    Ok(())
}
