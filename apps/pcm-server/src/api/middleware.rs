//! Request-scoped middleware: correlation id + request logging (§10.2,
//! mirroring `ferrum`'s request-logging layer), and the mTLS gate shared
//! by every route except the two discovery endpoints.

use std::time::Instant;

use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Response},
    Extension,
};
use tracing::Span;
use uuid::Uuid;

use crate::error::Error;
use crate::request_context::RequestContext;
use crate::tls::PeerCertThumbprint;

#[tracing::instrument(
    skip_all,
    fields(
        method = %request.method(),
        path = %request.uri().path(),
        request_id = tracing::field::Empty,
    )
)]
pub async fn request_context(mut request: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    Span::current().record("request_id", &request_id);
    let started = Instant::now();

    request.extensions_mut().insert(RequestContext {
        request_id: request_id.clone(),
    });

    let response = next.run(request).await;

    let status = response.status();
    let latency_ms = started.elapsed().as_millis();
    if status.is_server_error() {
        tracing::error!(%status, latency_ms, "request failed");
    } else if status.is_client_error() {
        tracing::warn!(%status, latency_ms, "request rejected");
    } else {
        tracing::info!(%status, latency_ms, "request completed");
    }

    response
}

/// Rejects any request with no verified mTLS peer certificate (§4.1 step
/// 1, §6 listener requirements). Runs after [`request_context`] so its
/// rejection still carries a `request_id`.
pub async fn require_mtls(
    Extension(peer_cert): Extension<Option<PeerCertThumbprint>>,
    request: Request,
    next: Next,
) -> Response {
    if peer_cert.is_none() {
        return Error::MtlsRequired.into_response();
    }
    next.run(request).await
}
