//! Records API router.
//!
//! Returns a composable `Router` that can be mounted on any axum
//! server. Routes are nested under `/api/`.

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api::endpoints;
use crate::api::types::ApiContext;
use crate::service::RecordService;

/// Build the records API router.
///
/// NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
pub fn records_api_router(service: Arc<RecordService>) -> Router {
    let ctx = ApiContext::new(service);

    let routes = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/records", get(endpoints::records::list))
        .route(
            "/records/:patient_id/:history_id",
            get(endpoints::records::detail),
        )
        .with_state(ctx);

    Router::new()
        .nest("/api", routes)
        .layer(CorsLayer::permissive())
}
