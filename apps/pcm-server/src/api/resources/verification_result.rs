//! `VerificationResult` CRUD/search (§4.2): open to any authenticated
//! caller for read/search; create defaults `validator` to the caller's
//! parent organization, falling back to the caller itself.

use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};

use pcm_models::{Reference, VerificationResult};

use crate::auth::Principal;
use crate::error::{Error, Result};
use crate::state::AppState;

pub async fn search(State(state): State<AppState>, _principal: Principal) -> Result<Json<Value>> {
    let results = state.fhir_store.list_verification_results().await;
    let entries: Vec<_> = results
        .iter()
        .map(|r| pcm_models::BundleEntry::matched(json!(r)))
        .collect();
    Ok(Json(json!(pcm_models::Bundle::searchset(entries))))
}

pub async fn read(
    State(state): State<AppState>,
    _principal: Principal,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let result = state
        .fhir_store
        .get_verification_result(&id)
        .await
        .ok_or(Error::NotFound { resource_type: "VerificationResult", id })?;
    Ok(Json(json!(result)))
}

pub async fn create(
    State(state): State<AppState>,
    principal: Principal,
    Json(mut incoming): Json<VerificationResult>,
) -> Result<Json<Value>> {
    if incoming.id.is_empty() {
        incoming.id = uuid::Uuid::new_v4().to_string();
    }
    if incoming.validator.is_empty() {
        let default_validator = match principal.organization(&state).await {
            Some(org) => match org.part_of {
                Some(parent) => parent,
                None => Reference::new("Organization", &principal.organization_id),
            },
            None => Reference::new("Organization", &principal.organization_id),
        };
        incoming.validator = vec![default_validator];
    }

    state.fhir_store.put_verification_result(incoming.clone()).await;
    Ok(Json(json!(incoming)))
}
