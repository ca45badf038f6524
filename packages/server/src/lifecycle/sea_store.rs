use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::AdStatus;
use sea_orm::sea_query::{Expr, ExprTrait, LockType};
use sea_orm::*;

use super::error::{LifecycleError, StoreError};
use super::models::{Advertisement, AdvertisementChanges, NewAdvertisement};
use super::store::{AdvertisementStore, Page};
use crate::entity::advertisement;

/// Status after one more impression, evaluated against the pre-update row.
const COMPLETION_CASE: &str = r#"CASE WHEN "current_impressions" + 1 >= "impression_count" THEN 'completed' ELSE "status" END"#;

/// Relational store backed by sea-orm.
#[derive(Clone)]
pub struct SeaAdvertisementStore {
    db: DatabaseConnection,
}

impl SeaAdvertisementStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AdvertisementStore for SeaAdvertisementStore {
    async fn insert(&self, record: NewAdvertisement) -> Result<Advertisement, StoreError> {
        let model = advertisement::ActiveModel {
            image_url: Set(record.image_url),
            image_path: Set(record.image_path),
            description: Set(record.description),
            start_time: Set(record.start_time),
            end_time: Set(record.end_time),
            impression_count: Set(record.impression_count),
            current_impressions: Set(record.current_impressions),
            status: Set(record.status),
            created_at: Set(record.created_at),
            updated_at: Set(None),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        Ok(model.into())
    }

    async fn get(&self, id: i32) -> Result<Option<Advertisement>, StoreError> {
        let model = advertisement::Entity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(Into::into))
    }

    async fn list(
        &self,
        status: Option<AdStatus>,
        page: Option<Page>,
    ) -> Result<Vec<Advertisement>, StoreError> {
        let mut query = advertisement::Entity::find().order_by_asc(advertisement::Column::Id);
        if let Some(status) = status {
            query = query.filter(advertisement::Column::Status.eq(status));
        }
        if let Some(page) = page {
            query = query.limit(page.limit).offset(page.offset);
        }

        let models = query.all(&self.db).await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn list_eligible(&self, now: DateTime<Utc>) -> Result<Vec<Advertisement>, StoreError> {
        let now = now.fixed_offset();
        let models = advertisement::Entity::find()
            .filter(advertisement::Column::Status.eq(AdStatus::Active))
            .filter(advertisement::Column::StartTime.lte(now))
            .filter(advertisement::Column::EndTime.gte(now))
            .filter(
                Expr::col(advertisement::Column::CurrentImpressions)
                    .lt(Expr::col(advertisement::Column::ImpressionCount)),
            )
            .order_by_asc(advertisement::Column::Id)
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn increment_impressions(
        &self,
        id: i32,
        at: DateTime<Utc>,
    ) -> Result<Option<Advertisement>, StoreError> {
        let txn = self.db.begin().await?;

        // Single statement: the database serializes concurrent increments.
        let result = advertisement::Entity::update_many()
            .col_expr(
                advertisement::Column::CurrentImpressions,
                Expr::col(advertisement::Column::CurrentImpressions).add(1),
            )
            .col_expr(advertisement::Column::Status, Expr::cust(COMPLETION_CASE))
            .col_expr(advertisement::Column::UpdatedAt, Expr::value(at))
            .filter(advertisement::Column::Id.eq(id))
            .exec(&txn)
            .await?;

        if result.rows_affected == 0 {
            txn.rollback().await?;
            return Ok(None);
        }

        let model = advertisement::Entity::find_by_id(id).one(&txn).await?;
        txn.commit().await?;

        Ok(model.map(Into::into))
    }

    async fn update(
        &self,
        id: i32,
        changes: &AdvertisementChanges,
        at: DateTime<Utc>,
    ) -> Result<Option<Advertisement>, LifecycleError> {
        let txn = self.db.begin().await?;

        let Some(existing) = advertisement::Entity::find_by_id(id)
            .lock(LockType::Update)
            .one(&txn)
            .await?
        else {
            txn.rollback().await?;
            return Ok(None);
        };

        // Re-check under the lock: another edit may have moved the window.
        let current = Advertisement::from(existing.clone());
        if let Err(e) = changes.validate_against(&current) {
            txn.rollback().await?;
            return Err(e);
        }

        let mut active: advertisement::ActiveModel = existing.into();
        if let Some(ref description) = changes.description {
            active.description = Set(description.clone());
        }
        if let Some(start_time) = changes.start_time {
            active.start_time = Set(start_time);
        }
        if let Some(end_time) = changes.end_time {
            active.end_time = Set(end_time);
        }
        if let Some(count) = changes.impression_count {
            active.impression_count = Set(count);
        }
        if let Some(status) = changes.status {
            active.status = Set(status);
        }
        active.updated_at = Set(Some(at));

        let model = active.update(&txn).await?;
        txn.commit().await?;

        Ok(Some(model.into()))
    }

    async fn delete(&self, id: i32) -> Result<bool, StoreError> {
        let result = advertisement::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(result.rows_affected > 0)
    }
}
