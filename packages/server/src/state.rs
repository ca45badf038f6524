use std::sync::Arc;

use common::image::ImageProvider;
use common::storage::AssetStore;
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::lifecycle::LifecycleEngine;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub engine: LifecycleEngine,
    pub assets: Arc<dyn AssetStore>,
    pub images: Arc<dyn ImageProvider>,
    pub config: AppConfig,
}
