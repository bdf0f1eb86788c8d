//! `Organization` CRUD/search (§4.2): any authenticated caller may search
//! and read; update is admin-only or self-service against one's own
//! organization, with `partOf`/`type` pinned and reactivation admin-gated.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde_json::{json, Value};

use pcm_store::include;

use crate::api::search::parse_include_directives;
use crate::auth::Principal;
use crate::error::{Error, Result};
use crate::state::AppState;

pub async fn search(
    State(state): State<AppState>,
    _principal: Principal,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>> {
    let mut organizations = state.fhir_store.list_organizations().await;
    if let Some(t) = params.get("type") {
        organizations.retain(|o| o.org_type.iter().any(|ty| ty.code() == t));
    }
    if let Some(name) = params.get("name") {
        let needle = name.to_lowercase();
        organizations.retain(|o| o.name.to_lowercase().contains(&needle));
    }
    if let Some(identifier) = params.get("identifier") {
        if let Ok(parsed) = pcm_models::Identifier::parse(identifier, pcm_models::systems::ORG_ID_SYSTEM) {
            organizations.retain(|o| o.identifier.as_ref() == Some(&parsed));
        }
    }

    let directives = parse_include_directives(&params);
    let included = include::expand(&state.fhir_store, &[], &organizations, &directives).await;

    let mut entries: Vec<_> = organizations
        .iter()
        .map(|o| pcm_models::BundleEntry::matched(json!(o)))
        .collect();
    entries.extend(included.into_iter().map(|r| pcm_models::BundleEntry::included(r.json)));

    Ok(Json(json!(pcm_models::Bundle::searchset(entries))))
}

pub async fn read(
    State(state): State<AppState>,
    _principal: Principal,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let org = state
        .fhir_store
        .get_organization(&id)
        .await
        .ok_or(Error::NotFound { resource_type: "Organization", id })?;
    Ok(Json(json!(org)))
}

pub async fn update(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
    Json(mut incoming): Json<pcm_models::Organization>,
) -> Result<Json<Value>> {
    let existing = state
        .fhir_store
        .get_organization(&id)
        .await
        .ok_or(Error::NotFound { resource_type: "Organization", id: id.clone() })?;

    let is_admin = principal.is_admin(&state).await;
    if !is_admin && principal.organization_id != id {
        return Err(Error::Forbidden(
            "only the PCM admin or the organization itself may update this Organization".to_string(),
        ));
    }

    incoming.id = id;
    if !is_admin {
        incoming.part_of = existing.part_of.clone();
        incoming.org_type = existing.org_type.clone();
        if !existing.active {
            incoming.active = false;
        }
    }

    state.fhir_store.put_organization(incoming.clone()).await;
    Ok(Json(json!(incoming)))
}
