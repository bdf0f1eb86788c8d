//! Route assembly (§6): the AS's `/token`/`/introspect`, the RS's `/r4`
//! CRUD/search surface, and the two unauthenticated discovery endpoints.

pub mod discovery;
pub mod introspect;
pub mod middleware;
pub mod resources;
pub mod search;
pub mod token;

use axum::middleware as axum_middleware;
use axum::routing::get;
use axum::Router;

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/r4/.well-known/smart-configuration", get(discovery::smart_configuration))
        .route("/r4/metadata", get(discovery::metadata));

    let protected = Router::new()
        .route("/token", axum::routing::post(token::issue_token))
        .route("/introspect", axum::routing::post(introspect::introspect_token))
        .route(
            "/r4/Organization",
            get(resources::organization::search),
        )
        .route(
            "/r4/Organization/:id",
            get(resources::organization::read).put(resources::organization::update),
        )
        .route(
            "/r4/Endpoint",
            get(resources::endpoint::search).post(resources::endpoint::create),
        )
        .route(
            "/r4/Endpoint/:id",
            get(resources::endpoint::read).put(resources::endpoint::update),
        )
        .route(
            "/r4/HealthcareService",
            get(resources::healthcare_service::search).post(resources::healthcare_service::create),
        )
        .route(
            "/r4/HealthcareService/:id",
            get(resources::healthcare_service::read).put(resources::healthcare_service::update),
        )
        .route(
            "/r4/Consent",
            get(resources::consent::search).post(resources::consent::create),
        )
        .route(
            "/r4/Consent/:id",
            get(resources::consent::read).put(resources::consent::update),
        )
        .route("/r4/Consent/:id/$approve", axum::routing::post(resources::consent::approve))
        .route("/r4/Consent/:id/$reject", axum::routing::post(resources::consent::reject))
        .route(
            "/r4/VerificationResult",
            get(resources::verification_result::search).post(resources::verification_result::create),
        )
        .route("/r4/VerificationResult/:id", get(resources::verification_result::read))
        .route_layer(axum_middleware::from_fn(middleware::require_mtls));

    public
        .merge(protected)
        .layer(axum_middleware::from_fn(middleware::request_context))
        .with_state(state)
}
