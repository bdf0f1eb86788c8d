//! Route assembly: the single `/auth-check` operation (§4.3, §6).

pub mod auth_check;
pub mod middleware;

use axum::middleware as axum_middleware;
use axum::routing::get;
use axum::Router;

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/auth-check", get(auth_check::auth_check))
        .layer(axum_middleware::from_fn(middleware::request_context))
        .with_state(state)
}
