use common::AdStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "advertisement")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Public URL of the creative.
    pub image_url: String,
    /// Asset store key, paired 1:1 with `image_url`.
    pub image_path: String,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    /// Stored with the caller's offset; compared as instants.
    pub start_time: DateTimeWithTimeZone,
    pub end_time: DateTimeWithTimeZone,

    /// Target number of impressions (>= 1).
    pub impression_count: i32,
    pub current_impressions: i32,

    pub status: AdStatus,

    pub created_at: DateTimeUtc,
    pub updated_at: Option<DateTimeUtc>,
}

impl ActiveModelBehavior for ActiveModel {}
