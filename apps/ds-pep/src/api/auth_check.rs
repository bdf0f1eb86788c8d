//! `GET /auth-check`: the gateway sub-request handler (§4.3).

use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use base64::Engine;
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};
use crate::identity::mint_local_token;
use crate::state::AppState;

const CLIENT_CERT_HEADER: &str = "x-client-cert";
const LOCAL_TOKEN_HEADER: &str = "x-local-token";

fn current_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is before the Unix epoch")
        .as_secs() as i64
}

/// Base64url (no padding) SHA-256 of the DER-encoded certificate, matching
/// the thumbprint format used by the AS (§6).
fn der_thumbprint(pem: &str) -> Option<String> {
    let der = rustls_pemfile::certs(&mut pem.as_bytes()).next()?.ok()?;
    let digest = Sha256::digest(der.as_ref());
    Some(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(digest))
}

pub async fn auth_check(State(state): State<AppState>, headers: HeaderMap) -> Result<Response> {
    // Step 1: extract bearer.
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(Error::MissingBearer)?;

    // Steps 2-4: introspect (caching our own access token and PCM's
    // discovery document internally).
    let introspection = state
        .pcm
        .introspect(token)
        .await
        .map_err(|e| Error::PcmUnreachable(e.to_string()))?;

    if !introspection.is_active() {
        return Err(Error::TokenInactive);
    }

    // Step 5: advisory thumbprint consistency check.
    if let Some(cert_header) = headers.get(CLIENT_CERT_HEADER).and_then(|v| v.to_str().ok()) {
        let decoded_pem = urlencoding::decode(cert_header).ok();
        let peer_thumbprint = decoded_pem.as_deref().and_then(der_thumbprint);

        if let (Some(peer_thumbprint), crate::pcm_client::IntrospectionResponse::Active { cnf, .. }) =
            (peer_thumbprint, &introspection)
        {
            if peer_thumbprint != cnf.x5t_s256 {
                tracing::warn!(
                    "mTLS peer certificate thumbprint does not match introspection's cnf.x5t#S256"
                );
            }
        }
    }

    // Steps 6-7: mint the local token and return it.
    let now = current_timestamp();
    let local_token = mint_local_token(
        state.config.local_token.hmac_secret.as_bytes(),
        state.config.local_token.ttl_seconds,
        token,
        &introspection,
        now,
    )?;

    let mut response = StatusCode::OK.into_response();
    response.headers_mut().insert(
        LOCAL_TOKEN_HEADER,
        HeaderValue::from_str(&local_token)
            .map_err(|e| Error::Other(anyhow::anyhow!("local token is not a valid header value: {e}")))?,
    );
    Ok(response)
}
