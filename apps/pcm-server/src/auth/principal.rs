//! The authenticated caller of an `/r4/*` request, resolved from the
//! opaque bearer token against the shared in-process token store (§5: AS
//! and RS share one process and one token map, so this never makes a
//! network call the way a real introspecting RS would).

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use pcm_models::Organization;

use crate::error::{Error, OAuthErrorCode};
use crate::state::AppState;

#[derive(Debug, Clone)]
pub struct Principal {
    pub client_id: String,
    pub organization_id: String,
    pub scope: String,
}

impl Principal {
    pub async fn is_admin(&self, state: &AppState) -> bool {
        matches!(
            state.fhir_store.get_organization(&self.organization_id).await,
            Some(org) if org.is_admin()
        )
    }

    pub async fn organization(&self, state: &AppState) -> Option<Organization> {
        state.fhir_store.get_organization(&self.organization_id).await
    }
}

impl FromRequestParts<AppState> for Principal {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| Error::Unauthorized("missing Authorization header".into()))?;

        let token = header_value
            .strip_prefix("Bearer ")
            .ok_or_else(|| Error::Unauthorized("Authorization header must be a Bearer token".into()))?;

        let now = current_timestamp();
        let record = state
            .token_store
            .get_active(token, now)
            .await
            .ok_or_else(|| Error::Unauthorized("token is expired or unknown".into()))?;

        let expected_aud = format!("{}/r4", state.config.server.public_base_url.trim_end_matches('/'));
        if record.aud != expected_aud {
            return Err(Error::oauth(
                axum::http::StatusCode::UNAUTHORIZED,
                OAuthErrorCode::AccessDenied,
                "token audience does not match this resource server",
            ));
        }

        Ok(Principal {
            client_id: record.sub,
            organization_id: record.organization_id,
            scope: record.scope,
        })
    }
}

fn current_timestamp() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system clock is before the Unix epoch")
        .as_secs() as i64
}
