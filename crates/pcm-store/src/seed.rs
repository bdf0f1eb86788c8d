//! Declarative bootstrap data: organizations, endpoints, healthcare
//! services, consents, and client registrations loaded at process start
//! (§3 "seeded at boot", §10.6).
//!
//! The default fixture is embedded at compile time; a deployment can point
//! at an overriding path via config instead.

use std::path::Path;

use pcm_models::consent::{ConsentActor, ConsentRole, ConsentStatus};
use pcm_models::healthcare_service::ServiceTag;
use pcm_models::organization::{ApplicableCertificates, OrgType};
use pcm_models::systems::{HEALTHCARE_SERVICE_CATALOG_ID_SYSTEM, ORG_ID_SYSTEM, PATIENT_ID_SYSTEM};
use pcm_models::{Consent, Endpoint, HealthcareService, Identifier, Organization, Reference};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::fhir_store::FhirStore;

const DEFAULT_SEED_TOML: &str = include_str!("../seed/default.toml");

/// A client registered to call the AS, per §3 "Client record". Not a FHIR
/// resource — no search/CRUD surface, just a lookup the AS's `/token`
/// handler consults.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientRecord {
    pub client_id: String,
    pub cert_path: String,
    pub organization_id: String,
    #[serde(default)]
    pub allowed_scopes: Vec<String>,
}

impl ClientRecord {
    pub fn allows_scope(&self, scope: &str) -> bool {
        self.allowed_scopes.iter().any(|s| s == scope)
    }
}

#[derive(Debug, Clone, Deserialize)]
struct SeedOrganization {
    id: String,
    #[serde(default = "default_true")]
    active: bool,
    name: String,
    #[serde(rename = "type")]
    org_type: Vec<OrgType>,
    #[serde(default)]
    identifier: Option<String>,
    #[serde(default)]
    part_of: Option<String>,
    #[serde(default)]
    endpoint: Vec<String>,
    #[serde(default)]
    applicable_certificates: Vec<String>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
struct SeedEndpoint {
    id: String,
    address: String,
    managing_organization: String,
    #[serde(default)]
    applicable_certificates: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct SeedHealthcareService {
    id: String,
    meta_tag: ServiceTag,
    #[serde(default)]
    active: bool,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    provided_by: Option<String>,
    #[serde(default)]
    catalog_identifier: Option<String>,
    #[serde(default)]
    based_on_canonical: Option<String>,
    #[serde(default)]
    category: Vec<String>,
    #[serde(default)]
    service_type: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct SeedConsentActor {
    role: ConsentRole,
    reference: String,
}

#[derive(Debug, Clone, Deserialize)]
struct SeedConsent {
    id: String,
    #[serde(default)]
    identifier: Option<String>,
    status: ConsentStatus,
    patient_identifier: String,
    #[serde(default)]
    actor: Vec<SeedConsentActor>,
    #[serde(default)]
    pcm_service: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct BootstrapSeed {
    #[serde(default)]
    organizations: Vec<SeedOrganization>,
    #[serde(default)]
    endpoints: Vec<SeedEndpoint>,
    #[serde(default)]
    healthcare_services: Vec<SeedHealthcareService>,
    #[serde(default)]
    consents: Vec<SeedConsent>,
    #[serde(default)]
    pub clients: Vec<ClientRecord>,
}

impl BootstrapSeed {
    pub fn load_default() -> Result<Self> {
        Self::parse(DEFAULT_SEED_TOML)
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())
            .map_err(|e| Error::InvalidSeed(format!("reading {}: {e}", path.as_ref().display())))?;
        Self::parse(&raw)
    }

    fn parse(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::InvalidSeed(e.to_string()))
    }

    /// Loads every organization, endpoint, healthcare service, and consent
    /// into `store`. Organizations are inserted first since endpoints and
    /// services reference them by id, matching the ordering guidance in
    /// §5 ("the canonical must be committed before the instance references
    /// it").
    pub async fn apply(&self, store: &FhirStore) -> Result<()> {
        for org in &self.organizations {
            store.put_organization(self.organization(org)?).await;
        }
        for ep in &self.endpoints {
            store.put_endpoint(self.endpoint(ep)).await;
        }
        for svc in &self.healthcare_services {
            store.put_healthcare_service(self.healthcare_service(svc)).await;
        }
        for consent in &self.consents {
            store.put_consent(self.consent(consent)?).await;
        }
        Ok(())
    }

    fn organization(&self, seed: &SeedOrganization) -> Result<Organization> {
        Ok(Organization {
            id: seed.id.clone(),
            active: seed.active,
            name: seed.name.clone(),
            org_type: seed.org_type.clone(),
            identifier: seed
                .identifier
                .as_ref()
                .map(|value| Identifier::new(ORG_ID_SYSTEM, value)),
            part_of: seed
                .part_of
                .as_ref()
                .map(|id| Reference::new("Organization", id)),
            endpoint: seed
                .endpoint
                .iter()
                .map(|id| Reference::new("Endpoint", id))
                .collect(),
            applicable_certificates: ApplicableCertificates {
                thumbprints: seed.applicable_certificates.clone(),
            },
        })
    }

    fn endpoint(&self, seed: &SeedEndpoint) -> Endpoint {
        Endpoint {
            id: seed.id.clone(),
            address: seed.address.clone(),
            managing_organization: Reference::new("Organization", &seed.managing_organization),
            applicable_certificates: seed.applicable_certificates.clone(),
        }
    }

    fn healthcare_service(&self, seed: &SeedHealthcareService) -> HealthcareService {
        HealthcareService {
            id: seed.id.clone(),
            meta_tag: seed.meta_tag,
            active: seed.active,
            name: seed.name.clone(),
            provided_by: seed
                .provided_by
                .as_ref()
                .map(|id| Reference::new("Organization", id)),
            catalog_identifier: seed.catalog_identifier.as_ref().map(|value| {
                Identifier::new(HEALTHCARE_SERVICE_CATALOG_ID_SYSTEM, value)
            }),
            based_on_canonical: seed
                .based_on_canonical
                .as_ref()
                .map(|id| Reference::new("HealthcareService", id)),
            category: seed.category.clone(),
            service_type: seed.service_type.clone(),
        }
    }

    fn consent(&self, seed: &SeedConsent) -> Result<Consent> {
        if seed.actor.iter().filter(|a| a.role == ConsentRole::Ircp).count() != 1 {
            return Err(Error::InvalidSeed(format!(
                "consent {} must have exactly one IRCP actor",
                seed.id
            )));
        }
        Ok(Consent {
            id: seed.id.clone(),
            identifier: Identifier::new(
                pcm_models::systems::CONSENT_ID_SYSTEM,
                seed.identifier.clone().unwrap_or_else(|| seed.id.clone()),
            ),
            status: seed.status,
            patient_identifier: Identifier::new(PATIENT_ID_SYSTEM, &seed.patient_identifier),
            actor: seed
                .actor
                .iter()
                .map(|a| ConsentActor {
                    role: a.role,
                    reference: Reference::new("Organization", &a.reference),
                })
                .collect(),
            pcm_service: seed
                .pcm_service
                .as_ref()
                .map(|id| Reference::new("HealthcareService", id)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_seed_parses() {
        let seed = BootstrapSeed::load_default().expect("default seed is valid TOML");
        assert!(seed.organizations.iter().any(|o| o.id == "org-sp"));
        assert_eq!(seed.clients.len(), 4);
    }

    #[tokio::test]
    async fn default_seed_applies_to_an_empty_store() {
        let seed = BootstrapSeed::load_default().unwrap();
        let store = FhirStore::new();
        seed.apply(&store).await.unwrap();

        assert!(store.get_organization("org-pcm").await.unwrap().is_admin());
        let repo = store.get_organization("org-vaccine-repo").await.unwrap();
        assert!(repo.is_data_source());
        assert!(store
            .org_manages_endpoint("org-vaccine-repo", "https://ds-gw:8080/fhir")
            .await);

        let consent = store.get_consent("consent-1").await.unwrap();
        assert_eq!(consent.status, ConsentStatus::Active);
        assert!(consent.has_actor(&Reference::new("Organization", "org-sp")));
        assert!(consent.has_actor(&Reference::new("Organization", "org-vaccine-repo")));
    }

    #[test]
    fn consent_missing_ircp_actor_is_rejected() {
        let toml = r#"
            [[consents]]
            id = "bad"
            status = "proposed"
            patient_identifier = "123"
        "#;
        let seed = BootstrapSeed::parse(toml).unwrap();
        let err = seed.consent(&seed.consents[0]).unwrap_err();
        assert!(matches!(err, Error::InvalidSeed(_)));
    }
}
