//! `POST /introspect`: resolves the caller's own access token (must carry
//! the `introspection` scope) and audience-binds the target token against
//! an Endpoint the caller's organization owns (§4.1).

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::Json;
use axum_extra::extract::Form;
use serde::{Deserialize, Serialize};

use pcm_models::systems::INTROSPECTION_SCOPE;
use pcm_models::token::{Cnf, FhirContextEntry};

use crate::api::token::current_timestamp;
use crate::error::{Error, OAuthErrorCode, Result};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct IntrospectRequest {
    token: String,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum IntrospectResponse {
    Inactive {
        active: bool,
    },
    Active {
        active: bool,
        sub: String,
        scope: String,
        iss: String,
        aud: String,
        client_id: String,
        organization_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        patient: Option<String>,
        #[serde(rename = "fhirContext", skip_serializing_if = "Vec::is_empty")]
        fhir_context: Vec<FhirContextEntry>,
        cnf: Cnf,
        exp: i64,
        iat: i64,
    },
}

/// Extracts the caller's own bearer token and resolves it to a client with
/// the `introspection` scope, independent of the `Principal` extractor used
/// by `/r4/*` (that one binds against the RS's own audience; this one just
/// needs to know which organization is calling).
async fn introspecting_organization(state: &AppState, headers: &axum::http::HeaderMap) -> Result<String> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| Error::oauth(StatusCode::UNAUTHORIZED, OAuthErrorCode::AccessDenied, "missing bearer token"))?;

    let now = current_timestamp();
    let record = state
        .token_store
        .get_active(token, now)
        .await
        .ok_or_else(|| Error::oauth(StatusCode::UNAUTHORIZED, OAuthErrorCode::AccessDenied, "token is expired or unknown"))?;

    if record.scope != INTROSPECTION_SCOPE {
        return Err(Error::oauth(
            StatusCode::UNAUTHORIZED,
            OAuthErrorCode::AccessDenied,
            "token does not carry the introspection scope",
        ));
    }

    Ok(record.organization_id)
}

pub async fn introspect_token(
    State(state): State<AppState>,
    headers: axum::http::HeaderMap,
    Form(req): Form<IntrospectRequest>,
) -> Result<Json<IntrospectResponse>> {
    let caller_org_id = introspecting_organization(&state, &headers).await?;

    // Step 1: the caller must itself be registered as a data source.
    if !state.fhir_store.organization_has_endpoint(&caller_org_id).await {
        return Err(Error::Forbidden(
            "calling organization has no registered Endpoint".to_string(),
        ));
    }

    // Step 2: look up the target token and audience-bind it.
    let now = current_timestamp();
    let target = match state.token_store.get_active(&req.token, now).await {
        Some(record) => record,
        None => return Ok(Json(IntrospectResponse::Inactive { active: false })),
    };

    if !state
        .fhir_store
        .org_manages_endpoint(&caller_org_id, &target.aud)
        .await
    {
        return Ok(Json(IntrospectResponse::Inactive { active: false }));
    }

    // Step 3: return the full record verbatim.
    Ok(Json(IntrospectResponse::Active {
        active: true,
        client_id: target.sub.clone(),
        sub: target.sub,
        scope: target.scope,
        iss: target.iss,
        aud: target.aud,
        organization_id: target.organization_id,
        patient: target.patient,
        fhir_context: target.fhir_context,
        cnf: target.cnf,
        exp: target.exp,
        iat: target.iat,
    }))
}
