//! The two unauthenticated discovery endpoints (§4.2, §6): SMART
//! configuration (used by a PEP's own discovery cache) and the
//! CapabilityStatement.

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::state::AppState;

pub async fn smart_configuration(State(state): State<AppState>) -> Json<Value> {
    let base = state.config.server.public_base_url.trim_end_matches('/');
    Json(json!({
        "issuer": base,
        "token_endpoint": format!("{base}/token"),
        "introspection_endpoint": format!("{base}/introspect"),
        "token_endpoint_auth_methods_supported": ["private_key_jwt"],
        "token_endpoint_auth_signing_alg_values_supported": ["RS256"],
        "grant_types_supported": ["client_credentials"],
        "capabilities": ["client-confidential-asymmetric"],
    }))
}

pub async fn metadata(State(state): State<AppState>) -> Json<Value> {
    let base = state.config.server.public_base_url.trim_end_matches('/');
    Json(json!({
        "resourceType": "CapabilityStatement",
        "status": "active",
        "kind": "instance",
        "fhirVersion": "4.0.1",
        "format": ["json"],
        "implementation": { "url": format!("{base}/r4") },
        "rest": [{
            "mode": "server",
            "resource": [
                { "type": "Organization" },
                { "type": "Endpoint" },
                { "type": "HealthcareService" },
                { "type": "Consent" },
                { "type": "VerificationResult" },
            ],
        }],
    }))
}
