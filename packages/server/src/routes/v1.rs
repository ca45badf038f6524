use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers::{advertisement, image};
use crate::state::AppState;

pub fn routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest(
            "/advertisements",
            advertisement_routes(config.storage.max_image_size),
        )
        .nest("/images", image_routes())
}

fn advertisement_routes(max_image_size: u64) -> OpenApiRouter<AppState> {
    let upload = OpenApiRouter::new()
        .routes(routes!(
            advertisement::list_advertisements,
            advertisement::create_advertisement
        ))
        .layer(advertisement::create_body_limit(max_image_size));

    OpenApiRouter::new()
        .routes(routes!(advertisement::generate_advertisement))
        .routes(routes!(advertisement::list_active_advertisements))
        .routes(routes!(
            advertisement::get_advertisement,
            advertisement::update_advertisement,
            advertisement::delete_advertisement
        ))
        .routes(routes!(advertisement::record_impression))
        .merge(upload)
}

fn image_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(image::list_models))
        .routes(routes!(image::generate_image))
}
