use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use adserver::config::AppConfig;
use adserver::database::init_db;
use adserver::lifecycle::{LifecycleEngine, SeaAdvertisementStore};
use adserver::state::AppState;
use anyhow::Context;
use common::config::{StorageBackend, StorageConfig};
use common::image::ImageProvider;
use common::image::huggingface::HuggingFaceProvider;
use common::storage::AssetStore;
use common::storage::filesystem::FilesystemAssetStore;
use common::storage::s3::S3AssetStore;
use tracing::{Level, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = AppConfig::load().context("Failed to load config")?;

    let db = init_db(&config.database.url)
        .await
        .context("Failed to connect to database")?;
    info!("Database ready");

    let assets = init_assets(&config.storage)
        .await
        .context("Failed to initialize asset storage")?;

    let images: Arc<dyn ImageProvider> = Arc::new(
        HuggingFaceProvider::new(&config.image).context("Failed to build image provider")?,
    );
    if config.image.api_token.as_deref().is_none_or(str::is_empty) {
        warn!("No image provider token configured, image generation will fail");
    }
    if config.docs.credentials().is_none() {
        warn!("Documentation credentials not set, /docs is publicly readable");
    }

    let engine = LifecycleEngine::new(
        Arc::new(SeaAdvertisementStore::new(db.clone())),
        Arc::clone(&assets),
    );

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let state = AppState {
        db,
        engine,
        assets,
        images,
        config,
    };
    let app = adserver::build_router(state);

    info!("Server running at http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn init_assets(config: &StorageConfig) -> anyhow::Result<Arc<dyn AssetStore>> {
    let store: Arc<dyn AssetStore> = match config.backend {
        StorageBackend::Filesystem => {
            info!(root = %config.filesystem.root, "Using filesystem asset storage");
            Arc::new(
                FilesystemAssetStore::new(
                    PathBuf::from(&config.filesystem.root),
                    config.filesystem.public_base_url.clone(),
                    config.max_image_size,
                )
                .await?,
            )
        }
        StorageBackend::S3 => {
            info!(bucket = %config.s3.bucket, "Using S3 asset storage");
            let store = S3AssetStore::new(&config.s3, config.max_image_size)?;
            if let Err(e) = store.ensure_bucket().await {
                warn!(bucket = %config.s3.bucket, error = %e, "Could not verify asset bucket");
            }
            Arc::new(store)
        }
    };
    Ok(store)
}
