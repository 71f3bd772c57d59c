//! Route definitions.

use crate::AppState;
use crate::handlers;
use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// ILS bridge routes
pub fn ils_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/alma/getItems", get(handlers::get_items))
        .route("/api/alma/setSecurity", post(handlers::set_security))
        .route("/api/alma/itemUpdate", post(handlers::item_update))
}

/// Reader discovery routes
pub fn reader_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/readers", get(handlers::readers))
}

/// Full application router.
///
/// CORS is open to any origin: the ILS calls the bridge from the
/// librarian's browser.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(ils_routes())
        .merge(reader_routes())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
