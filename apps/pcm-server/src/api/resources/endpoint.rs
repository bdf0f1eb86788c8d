//! `Endpoint` CRUD/search (§4.2): create requires a non-admin caller to own
//! the endpoint it registers; update is restricted to the managing
//! organization (or the admin).

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde_json::{json, Value};

use pcm_models::{Endpoint, Reference};

use crate::auth::Principal;
use crate::error::{Error, Result};
use crate::state::AppState;

pub async fn search(
    State(state): State<AppState>,
    _principal: Principal,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>> {
    let mut endpoints = state.fhir_store.list_endpoints().await;
    if let Some(thumbprint) = params.get("thumbprint") {
        endpoints.retain(|e| e.applicable_certificates.iter().any(|t| t == thumbprint));
    }
    let entries: Vec<_> = endpoints.iter().map(|e| pcm_models::BundleEntry::matched(json!(e))).collect();
    Ok(Json(json!(pcm_models::Bundle::searchset(entries))))
}

pub async fn read(
    State(state): State<AppState>,
    _principal: Principal,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let endpoint = state
        .fhir_store
        .get_endpoint(&id)
        .await
        .ok_or(Error::NotFound { resource_type: "Endpoint", id })?;
    Ok(Json(json!(endpoint)))
}

pub async fn create(
    State(state): State<AppState>,
    principal: Principal,
    Json(incoming): Json<Endpoint>,
) -> Result<Json<Value>> {
    let is_admin = principal.is_admin(&state).await;
    if !is_admin && incoming.managing_organization.id != principal.organization_id {
        return Err(Error::Forbidden(
            "non-admin callers may only register endpoints they manage".to_string(),
        ));
    }
    state.fhir_store.put_endpoint(incoming.clone()).await;
    Ok(Json(json!(incoming)))
}

pub async fn update(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
    Json(mut incoming): Json<Endpoint>,
) -> Result<Json<Value>> {
    let existing = state
        .fhir_store
        .get_endpoint(&id)
        .await
        .ok_or(Error::NotFound { resource_type: "Endpoint", id: id.clone() })?;

    let is_admin = principal.is_admin(&state).await;
    let caller_ref = Reference::new("Organization", &principal.organization_id);
    if !is_admin && existing.managing_organization != caller_ref {
        return Err(Error::Forbidden(
            "non-admin callers may only modify endpoints they manage".to_string(),
        ));
    }

    incoming.id = id;
    if !is_admin {
        incoming.managing_organization = existing.managing_organization.clone();
    }

    state.fhir_store.put_endpoint(incoming.clone()).await;
    Ok(Json(json!(incoming)))
}
