//! `HealthcareService` CRUD/search (§4.2): the `catalog`/`instance` split,
//! with non-admin creates auto-materializing a canonical (T6).

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde_json::{json, Value};

use pcm_models::healthcare_service::ServiceTag;
use pcm_models::systems::HEALTHCARE_SERVICE_CATALOG_ID_SYSTEM;
use pcm_models::{HealthcareService, Identifier, Reference};

use crate::auth::Principal;
use crate::error::{Error, Result};
use crate::state::AppState;

pub async fn search(
    State(state): State<AppState>,
    _principal: Principal,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>> {
    let mut services = state.fhir_store.list_healthcare_services().await;
    if let Some(provided_by) = params.get("providedBy") {
        services.retain(|s| s.provided_by.as_ref().is_some_and(|r| &r.id == provided_by));
    }
    if let Some(category) = params.get("category") {
        services.retain(|s| s.category.iter().any(|c| c == category));
    }
    if let Some(service_type) = params.get("type") {
        services.retain(|s| s.service_type.iter().any(|t| t == service_type));
    }
    if let Some(identifier) = params.get("identifier") {
        let parsed = Identifier::parse(identifier, HEALTHCARE_SERVICE_CATALOG_ID_SYSTEM).ok();
        services.retain(|s| s.catalog_identifier.as_ref() == parsed.as_ref());
    }
    if let Some(name) = params.get("name") {
        let needle = name.to_lowercase();
        services.retain(|s| s.name.as_deref().is_some_and(|n| n.to_lowercase().contains(&needle)));
    }
    if let Some(active) = params.get("active") {
        let wanted = active == "true";
        services.retain(|s| s.active == wanted);
    }

    let entries: Vec<_> = services.iter().map(|s| pcm_models::BundleEntry::matched(json!(s))).collect();
    Ok(Json(json!(pcm_models::Bundle::searchset(entries))))
}

pub async fn read(
    State(state): State<AppState>,
    _principal: Principal,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let service = state
        .fhir_store
        .get_healthcare_service(&id)
        .await
        .ok_or(Error::NotFound { resource_type: "HealthcareService", id })?;
    Ok(Json(json!(service)))
}

pub async fn create(
    State(state): State<AppState>,
    principal: Principal,
    Json(mut incoming): Json<HealthcareService>,
) -> Result<Json<Value>> {
    if incoming.id.is_empty() {
        incoming.id = uuid::Uuid::new_v4().to_string();
    }

    let is_admin = principal.is_admin(&state).await;
    if !is_admin && incoming.meta_tag != ServiceTag::Catalog {
        incoming.meta_tag = ServiceTag::Instance;
        incoming.provided_by = Some(Reference::new("Organization", &principal.organization_id));
        if incoming.based_on_canonical.is_none() {
            let canonical = HealthcareService {
                id: uuid::Uuid::new_v4().to_string(),
                meta_tag: ServiceTag::Catalog,
                active: true,
                name: incoming.name.clone(),
                provided_by: None,
                catalog_identifier: Some(Identifier::new(
                    HEALTHCARE_SERVICE_CATALOG_ID_SYSTEM,
                    uuid::Uuid::new_v4().to_string(),
                )),
                based_on_canonical: None,
                category: incoming.category.clone(),
                service_type: incoming.service_type.clone(),
            };
            state.fhir_store.put_healthcare_service(canonical.clone()).await;
            incoming.based_on_canonical = Some(canonical.reference());
        }
    }

    state.fhir_store.put_healthcare_service(incoming.clone()).await;
    Ok(Json(json!(incoming)))
}

pub async fn update(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
    Json(mut incoming): Json<HealthcareService>,
) -> Result<Json<Value>> {
    let existing = state
        .fhir_store
        .get_healthcare_service(&id)
        .await
        .ok_or(Error::NotFound { resource_type: "HealthcareService", id: id.clone() })?;

    let is_admin = principal.is_admin(&state).await;
    if !is_admin {
        if existing.is_catalog() {
            return Err(Error::Forbidden("non-admin callers may not edit a catalog HealthcareService".to_string()));
        }
        let caller_ref = Reference::new("Organization", &principal.organization_id);
        if existing.provided_by.as_ref() != Some(&caller_ref) {
            return Err(Error::Forbidden(
                "non-admin callers may only edit HealthcareService instances they provide".to_string(),
            ));
        }
    }

    incoming.id = id;
    if !is_admin {
        incoming.provided_by = existing.provided_by.clone();
        incoming.meta_tag = existing.meta_tag;
    }

    state.fhir_store.put_healthcare_service(incoming.clone()).await;
    Ok(Json(json!(incoming)))
}
