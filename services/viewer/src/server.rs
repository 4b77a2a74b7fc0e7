//! Router construction.

use std::sync::Arc;

use axum::{
    extract::Extension,
    routing::{get, post},
    Router,
};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::handlers;
use crate::state::AppState;

/// Create the viewer API router.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/map", get(handlers::map_handler))
        .route("/layers", get(handlers::layers_handler))
        .route("/layers/:id", post(handlers::check_handler))
        .route("/order", get(handlers::order_handler))
        .route(
            "/date",
            get(handlers::get_date_handler)
                .post(handlers::set_date_handler)
                .delete(handlers::clear_date_handler),
        )
        .route("/tiles/:id/:z/:x/:y", get(handlers::tile_url_handler))
        .route("/images/:id", get(handlers::image_url_handler))
        .route("/health", get(handlers::health_handler))
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}
