//! `Consent` CRUD/search and the admin-gated `$approve`/`$reject` state
//! transitions (§4.2, §9, §10.4).

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use pcm_models::consent::{ConsentActor, ConsentEdit, ConsentRole, ConsentStatus};
use pcm_models::systems::{CONSENT_ID_SYSTEM, PATIENT_ID_SYSTEM};
use pcm_models::{BundleEntry, Consent, Identifier, Reference};
use pcm_store::include;

use crate::api::search::parse_include_directives;
use crate::auth::Principal;
use crate::error::{Error, Result};
use crate::state::AppState;

fn status_str(status: ConsentStatus) -> &'static str {
    match status {
        ConsentStatus::Proposed => "proposed",
        ConsentStatus::Active => "active",
        ConsentStatus::Inactive => "inactive",
        ConsentStatus::Rejected => "rejected",
    }
}

fn require_admin_client(state: &AppState, principal: &Principal) -> Result<()> {
    if principal.client_id != state.config.admin.client_id {
        return Err(Error::Forbidden(
            "only the PCM admin client may drive this transition".to_string(),
        ));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct ConsentCreateRequest {
    patient_identifier: String,
    #[serde(default)]
    pcm_service: Option<String>,
}

pub async fn create(
    State(state): State<AppState>,
    principal: Principal,
    Json(req): Json<ConsentCreateRequest>,
) -> Result<Json<Value>> {
    if principal.organization(&state).await.is_none() {
        return Err(Error::InvalidRequest("caller organization is not resolvable".to_string()));
    }
    let patient_identifier = Identifier::parse(&req.patient_identifier, PATIENT_ID_SYSTEM)
        .map_err(|_| Error::InvalidRequest("patient_identifier is malformed".to_string()))?;

    let id = uuid::Uuid::new_v4().to_string();
    let consent = Consent {
        id: id.clone(),
        identifier: Identifier::new(CONSENT_ID_SYSTEM, id),
        status: ConsentStatus::Proposed,
        patient_identifier,
        actor: vec![ConsentActor {
            role: ConsentRole::Ircp,
            reference: Reference::new("Organization", &principal.organization_id),
        }],
        pcm_service: req.pcm_service.map(|id| Reference::new("HealthcareService", id)),
    };
    state.fhir_store.put_consent(consent.clone()).await;
    Ok(Json(json!(consent)))
}

pub async fn read(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let not_found = || Error::NotFound { resource_type: "Consent", id: id.clone() };
    let consent = state.fhir_store.get_consent(&id).await.ok_or_else(not_found)?;

    let is_admin = principal.is_admin(&state).await;
    let caller_ref = Reference::new("Organization", &principal.organization_id);
    if !is_admin && !consent.has_actor(&caller_ref) {
        return Err(not_found());
    }
    Ok(Json(json!(consent)))
}

pub async fn search(
    State(state): State<AppState>,
    principal: Principal,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>> {
    let mut consents = state.fhir_store.list_consents().await;

    let is_admin = principal.is_admin(&state).await;
    if !is_admin {
        let caller_ref = Reference::new("Organization", &principal.organization_id);
        consents.retain(|c| c.has_actor(&caller_ref));
    }

    if let Some(id) = params.get("_id") {
        consents.retain(|c| &c.id == id);
    }
    if let Some(status) = params.get("status") {
        consents.retain(|c| status_str(c.status) == status);
    }
    if let Some(patient) = params.get("patient").or_else(|| params.get("patient.identifier")) {
        if let Ok(parsed) = Identifier::parse(patient, PATIENT_ID_SYSTEM) {
            consents.retain(|c| c.patient_identifier == parsed);
        }
    }
    if let Some(service_id) = params.get("pcm-service") {
        consents.retain(|c| c.pcm_service.as_ref().is_some_and(|r| &r.id == service_id));
    }

    // (T4) `_include` for a non-admin search is scoped to the
    // already-filtered, actor-visible consent set — no org/endpoint reachable
    // only from a consent the caller cannot see is ever pulled in.
    let directives = parse_include_directives(&params);
    let included = include::expand(&state.fhir_store, &consents, &[], &directives).await;

    let mut entries: Vec<_> = consents.iter().map(|c| BundleEntry::matched(json!(c))).collect();
    entries.extend(included.into_iter().map(|r| BundleEntry::included(r.json)));

    Ok(Json(json!(pcm_models::Bundle::searchset(entries))))
}

pub async fn update(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
    Json(incoming): Json<Consent>,
) -> Result<Json<Value>> {
    let existing = state
        .fhir_store
        .get_consent(&id)
        .await
        .ok_or(Error::NotFound { resource_type: "Consent", id: id.clone() })?;

    let is_admin = principal.is_admin(&state).await;
    let caller_ref = Reference::new("Organization", &principal.organization_id);
    let caller_is_ircp = existing.ircp_actor().is_some_and(|a| a.reference == caller_ref);

    let mut without_status_change = incoming.clone();
    without_status_change.status = existing.status;
    let edit = if without_status_change == existing {
        ConsentEdit::StatusOnly(incoming.status)
    } else {
        ConsentEdit::Other
    };

    if !existing.authorize_update(is_admin, caller_is_ircp, &edit) {
        return Err(Error::Forbidden("not permitted to modify this Consent".to_string()));
    }

    let mut updated = incoming;
    updated.id = id;
    state.fhir_store.put_consent(updated.clone()).await;
    Ok(Json(json!(updated)))
}

#[derive(Debug, Deserialize)]
pub struct ApproveRequest {
    cst_organization_id: String,
}

pub async fn approve(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
    Json(req): Json<ApproveRequest>,
) -> Result<Json<Value>> {
    require_admin_client(&state, &principal)?;

    let mut consent = state
        .fhir_store
        .get_consent(&id)
        .await
        .ok_or(Error::NotFound { resource_type: "Consent", id: id.clone() })?;
    if consent.status != ConsentStatus::Proposed {
        return Err(Error::InvalidRequest("consent is not in the proposed state".to_string()));
    }
    match state.fhir_store.get_organization(&req.cst_organization_id).await {
        Some(org) if org.is_data_source() => {}
        _ => {
            return Err(Error::InvalidRequest(
                "cst_organization_id must reference a known Organization of type source".to_string(),
            ))
        }
    }

    consent.actor.push(ConsentActor {
        role: ConsentRole::Cst,
        reference: Reference::new("Organization", &req.cst_organization_id),
    });
    consent.status = ConsentStatus::Active;
    state.fhir_store.put_consent(consent.clone()).await;
    Ok(Json(json!(consent)))
}

pub async fn reject(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    require_admin_client(&state, &principal)?;

    let mut consent = state
        .fhir_store
        .get_consent(&id)
        .await
        .ok_or(Error::NotFound { resource_type: "Consent", id: id.clone() })?;
    if consent.status != ConsentStatus::Proposed {
        return Err(Error::InvalidRequest("consent is not in the proposed state".to_string()));
    }

    consent.status = ConsentStatus::Rejected;
    state.fhir_store.put_consent(consent.clone()).await;
    Ok(Json(json!(consent)))
}
