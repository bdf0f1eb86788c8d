//! Route assembly: the single `GET /fhir/Bundle` operation (§4.4, §6).

pub mod bundle;
pub mod middleware;

use axum::middleware as axum_middleware;
use axum::routing::get;
use axum::Router;

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/fhir/Bundle", get(bundle::read_bundle))
        .layer(axum_middleware::from_fn(middleware::request_context))
        .with_state(state)
}
