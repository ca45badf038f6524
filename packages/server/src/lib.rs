pub mod config;
pub mod database;
pub mod entity;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod lifecycle;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;

use std::time::Duration;

use axum::http::HeaderValue;
use axum::routing::get;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;
use utoipa_scalar::{Scalar, Servable as ScalarServable};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::CorsConfig;
use crate::middleware::docs_auth::{DocsCredentials, require_docs_auth};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Advertisement Server API",
        version = "1.0.0",
        description = "Scheduling, impression counting and creative management for advertisements"
    ),
    tags(
        (name = "Advertisements", description = "Advertisement lifecycle and impressions"),
        (name = "Images", description = "Text-to-image generation"),
        (name = "Health", description = "Service health"),
    ),
)]
struct ApiDoc;

/// Build the application router.
pub fn build_router(state: AppState) -> axum::Router {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .routes(routes!(handlers::health::health))
        .nest("/api", routes::api_routes(&state.config))
        .split_for_parts();

    let docs = axum::Router::new()
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", api.clone()))
        .merge(Scalar::with_url("/scalar", api));
    let docs = match state.config.docs.credentials() {
        Some((username, password)) => docs.layer(axum::middleware::from_fn_with_state(
            DocsCredentials::new(username, password),
            require_docs_auth,
        )),
        None => docs,
    };

    let cors = cors_layer(&state.config.server.cors);

    router
        .route("/assets/{*key}", get(handlers::assets::serve_asset))
        .with_state(state)
        .merge(docs)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allow_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();
    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(Duration::from_secs(config.max_age))
}
