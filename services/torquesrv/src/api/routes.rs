//! API routes configuration

use axum::{routing::get, Router};

use crate::api::handlers::add;
use crate::AppState;

/// Create API routes
///
/// The ingestion route answers both GET and POST; only the query string is
/// read.
pub fn create_router(state: AppState) -> Router {
    let route = state.config.api.route.clone();

    Router::new()
        .route(&route, get(add).post(add))
        .with_state(state)
}
