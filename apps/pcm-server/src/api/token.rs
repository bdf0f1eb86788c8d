//! `POST /token`: the ten-step client-credentials + private-key-JWT
//! issuance pipeline (§4.1).

use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use axum_extra::extract::Form;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use pcm_models::systems::{DEFAULT_SYSTEM_SCOPE, DS_DATA_SCOPE, JWT_BEARER_ASSERTION_TYPE};
use pcm_models::token::{Cnf, FhirContextEntry, FhirContextType};
use pcm_models::{ConsentStatus, Identifier, Reference, TokenRecord};

use crate::auth::assertion::{verify_client_assertion, ClientAssertionClaims};
use crate::error::{Error, OAuthErrorCode, Result};
use crate::state::AppState;
use crate::tls::PeerCertThumbprint;

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    grant_type: String,
    client_assertion_type: String,
    client_assertion: String,
    resource: String,
    #[serde(default)]
    scope: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    access_token: String,
    token_type: &'static str,
    expires_in: i64,
    scope: String,
}

/// Decodes `assertion`'s claims without verifying the signature, to learn
/// `iss` before step 5 can look up which client's certificate to verify
/// against.
fn peek_claims(assertion: &str) -> Result<ClientAssertionClaims> {
    let mut validation = Validation::new(Algorithm::RS256);
    validation.insecure_disable_signature_validation();
    validation.validate_aud = false;
    validation.validate_exp = false;
    validation.required_spec_claims.clear();

    let key = DecodingKey::from_secret(&[]);
    jsonwebtoken::decode::<ClientAssertionClaims>(assertion, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            Error::oauth(
                StatusCode::UNAUTHORIZED,
                OAuthErrorCode::InvalidClient,
                format!("malformed client assertion: {e}"),
            )
        })
}

pub async fn issue_token(
    State(state): State<AppState>,
    Extension(peer_cert): Extension<Option<PeerCertThumbprint>>,
    Form(req): Form<TokenRequest>,
) -> Result<Json<TokenResponse>> {
    // Step 1 (mTLS gate) already ran in `require_mtls`; `peer_cert` is
    // `Some` by the time a handler runs behind that middleware.
    let peer_thumbprint = peer_cert.map(|t| t.0);

    // Step 2: grant/assertion shape.
    if req.grant_type != "client_credentials" {
        return Err(Error::oauth(
            StatusCode::BAD_REQUEST,
            OAuthErrorCode::UnsupportedGrantType,
            "grant_type must be client_credentials",
        ));
    }
    if req.client_assertion_type != JWT_BEARER_ASSERTION_TYPE {
        return Err(Error::oauth(
            StatusCode::UNAUTHORIZED,
            OAuthErrorCode::InvalidClient,
            "client_assertion_type must be the JWT-bearer assertion type",
        ));
    }

    // Step 3: resource presence.
    if req.resource.trim().is_empty() {
        return Err(Error::oauth(
            StatusCode::BAD_REQUEST,
            OAuthErrorCode::InvalidRequest,
            "resource is required",
        ));
    }

    // Step 4: assertion decode, sub == iss.
    let peeked = peek_claims(&req.client_assertion)?;
    if peeked.sub != peeked.iss {
        return Err(Error::oauth(
            StatusCode::UNAUTHORIZED,
            OAuthErrorCode::InvalidClient,
            "assertion sub and iss must match",
        ));
    }

    // Step 5: client lookup.
    let client = state.client(&peeked.iss).cloned().ok_or_else(|| {
        Error::oauth(
            StatusCode::UNAUTHORIZED,
            OAuthErrorCode::InvalidClient,
            "unknown client",
        )
    })?;
    let cert_pem = std::fs::read(&client.cert_path).map_err(|e| {
        anyhow::anyhow!("reading registered certificate for {}: {e}", client.client_id)
    })?;

    // Step 6: full signature verification.
    let accepted_audiences = state.config.server.accepted_assertion_audiences();
    let claims = verify_client_assertion(&req.client_assertion, &cert_pem, &accepted_audiences)?;

    // Scope: the requested scope (defaulting to the system scope) must be
    // one the client is registered for; a B2B grant overrides this below
    // with the fixed DS-data scope regardless of what was requested.
    let requested_scope = req
        .scope
        .clone()
        .unwrap_or_else(|| DEFAULT_SYSTEM_SCOPE.to_string());
    if !client.allows_scope(&requested_scope) {
        return Err(Error::oauth(
            StatusCode::BAD_REQUEST,
            OAuthErrorCode::InvalidRequest,
            format!("client is not registered for scope {requested_scope}"),
        ));
    }
    let mut scope = requested_scope;
    let mut patient: Option<String> = None;
    let mut fhir_context: Vec<FhirContextEntry> = Vec::new();

    if let Some(b2b) = claims.extensions.as_ref().and_then(|e| e.hl7_b2b.as_ref()) {
        if b2b.organization_id != client.organization_id {
            return Err(Error::oauth(
                StatusCode::UNAUTHORIZED,
                OAuthErrorCode::UnauthorizedClient,
                "organization_id does not match the client's bound organization",
            ));
        }

        for consent_ref in &b2b.consent_reference {
            let consent = state
                .fhir_store
                .get_consent(consent_ref)
                .await
                .ok_or_else(|| {
                    Error::oauth(
                        StatusCode::BAD_REQUEST,
                        OAuthErrorCode::InvalidGrant,
                        format!("consent {consent_ref} not found"),
                    )
                })?;
            if consent.status != ConsentStatus::Active {
                return Err(Error::oauth(
                    StatusCode::BAD_REQUEST,
                    OAuthErrorCode::InvalidGrant,
                    format!("consent {consent_ref} is not active"),
                ));
            }

            let org_ref = Reference::new("Organization", &client.organization_id);
            if !consent.has_actor(&org_ref) {
                return Err(Error::oauth(
                    StatusCode::UNAUTHORIZED,
                    OAuthErrorCode::AccessDenied,
                    "Client is not a party to this consent",
                ));
            }

            let mut resource_bound = false;
            for cst in consent.cst_actors() {
                if state
                    .fhir_store
                    .org_manages_endpoint(&cst.reference.id, &req.resource)
                    .await
                {
                    resource_bound = true;
                    break;
                }
            }
            if !resource_bound {
                return Err(Error::oauth(
                    StatusCode::BAD_REQUEST,
                    OAuthErrorCode::InvalidTarget,
                    "resource does not match any endpoint owned by a custodian of this consent",
                ));
            }

            fhir_context.push(FhirContextEntry {
                context_type: FhirContextType::Consent,
                identifier: consent.identifier.clone(),
            });

            if let Some(service_ref) = &consent.pcm_service {
                if let Some(service) = state.fhir_store.get_healthcare_service(&service_ref.id).await {
                    let (catalog_identifier, catalog_fallback_id) = if service.is_instance() {
                        match &service.based_on_canonical {
                            Some(canonical_ref) => {
                                match state.fhir_store.get_healthcare_service(&canonical_ref.id).await {
                                    Some(canonical) => (
                                        canonical.catalog_identifier.clone(),
                                        canonical.id.clone(),
                                    ),
                                    None => (None, service.id.clone()),
                                }
                            }
                            None => (service.catalog_identifier.clone(), service.id.clone()),
                        }
                    } else {
                        (service.catalog_identifier.clone(), service.id.clone())
                    };

                    let identifier = catalog_identifier.unwrap_or_else(|| {
                        Identifier::new(
                            pcm_models::systems::HEALTHCARE_SERVICE_CATALOG_ID_SYSTEM,
                            catalog_fallback_id,
                        )
                    });
                    fhir_context.push(FhirContextEntry {
                        context_type: FhirContextType::HealthcareService,
                        identifier,
                    });
                }
            }

            patient = Some(consent.patient_identifier.as_pipe_form());
        }

        scope = DS_DATA_SCOPE.to_string();
    }

    // Step 8: holder-of-key confirmation (warn-only on mismatch).
    let cnf_thumbprint = pcm_models::thumbprint::thumbprint_pem(&cert_pem).ok_or_else(|| {
        anyhow::anyhow!("registered certificate for {} has no parseable DER", client.client_id)
    })?;
    if let Some(peer) = &peer_thumbprint {
        if peer != &cnf_thumbprint {
            tracing::warn!(
                client_id = %client.client_id,
                "mTLS peer certificate thumbprint does not match the registered assertion-signing certificate"
            );
        }
    }

    // Step 10: minting.
    let now = current_timestamp();
    let ttl = state.config.token.ttl_seconds;
    let record = TokenRecord {
        token: uuid::Uuid::new_v4().to_string(),
        sub: client.client_id.clone(),
        organization_id: client.organization_id.clone(),
        scope: scope.clone(),
        iss: claims.iss.clone(),
        aud: req.resource.clone(),
        patient,
        fhir_context,
        cnf: Cnf {
            x5t_s256: cnf_thumbprint,
        },
        iat: now,
        exp: now + ttl,
    };
    state.token_store.insert(record.clone()).await;

    Ok(Json(TokenResponse {
        access_token: record.token,
        token_type: "Bearer",
        expires_in: ttl,
        scope,
    }))
}

pub fn current_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is before the Unix epoch")
        .as_secs() as i64
}
