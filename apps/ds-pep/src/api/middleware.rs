//! Request-scoped correlation id and completion logging (§10.2), the same
//! shape as the PCM server's request-logging layer.

use std::time::Instant;

use axum::{extract::Request, middleware::Next, response::Response};
use tracing::Span;
use uuid::Uuid;

#[tracing::instrument(
    skip_all,
    fields(
        method = %request.method(),
        path = %request.uri().path(),
        request_id = tracing::field::Empty,
    )
)]
pub async fn request_context(request: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    Span::current().record("request_id", &request_id);
    let started = Instant::now();

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
