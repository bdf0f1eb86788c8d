//! The Organization/Endpoint/HealthcareService/Consent/VerificationResult
//! graph: per-type maps guarded independently so a read of one type never
//! blocks a write to another.

use std::collections::HashMap;

use pcm_models::{Consent, Endpoint, HealthcareService, Organization, VerificationResult};
use tokio::sync::RwLock;

use crate::error::{Error, Result};

#[derive(Default)]
pub struct FhirStore {
    organizations: RwLock<HashMap<String, Organization>>,
    endpoints: RwLock<HashMap<String, Endpoint>>,
    healthcare_services: RwLock<HashMap<String, HealthcareService>>,
    consents: RwLock<HashMap<String, Consent>>,
    verification_results: RwLock<HashMap<String, VerificationResult>>,
}

/// Generates the boilerplate read/write/list methods for one resource map.
/// Every resource kind needs the same four operations; the authorization
/// logic that decides *whether* a given write is allowed lives one layer up
/// in the RS handlers, not here — this type is a plain store.
macro_rules! resource_map_ops {
    ($get:ident, $put:ident, $list:ident, $remove:ident, $field:ident, $ty:ty, $label:expr) => {
        pub async fn $get(&self, id: &str) -> Option<$ty> {
            self.$field.read().await.get(id).cloned()
        }

        pub async fn $put(&self, resource: $ty) {
            let id = resource_id(&resource);
            self.$field.write().await.insert(id, resource);
        }

        pub async fn $list(&self) -> Vec<$ty> {
            self.$field.read().await.values().cloned().collect()
        }

        #[allow(dead_code)]
        pub async fn $remove(&self, id: &str) -> Result<()> {
            self.$field
                .write()
                .await
                .remove(id)
                .map(|_| ())
                .ok_or_else(|| Error::NotFound {
                    resource_type: $label,
                    id: id.to_string(),
                })
        }
    };
}

/// Extracts the primary key from each resource kind, for the `$put` arm above.
trait HasId {
    fn id_of(&self) -> &str;
}
impl HasId for Organization {
    fn id_of(&self) -> &str {
        &self.id
    }
}
impl HasId for Endpoint {
    fn id_of(&self) -> &str {
        &self.id
    }
}
impl HasId for HealthcareService {
    fn id_of(&self) -> &str {
        &self.id
    }
}
impl HasId for Consent {
    fn id_of(&self) -> &str {
        &self.id
    }
}
impl HasId for VerificationResult {
    fn id_of(&self) -> &str {
        &self.id
    }
}

fn resource_id<T: HasId>(r: &T) -> String {
    r.id_of().to_string()
}

impl FhirStore {
    pub fn new() -> Self {
        Self::default()
    }

    resource_map_ops!(
        get_organization,
        put_organization,
        list_organizations,
        remove_organization,
        organizations,
        Organization,
        "Organization"
    );
    resource_map_ops!(
        get_endpoint,
        put_endpoint,
        list_endpoints,
        remove_endpoint,
        endpoints,
        Endpoint,
        "Endpoint"
    );
    resource_map_ops!(
        get_healthcare_service,
        put_healthcare_service,
        list_healthcare_services,
        remove_healthcare_service,
        healthcare_services,
        HealthcareService,
        "HealthcareService"
    );
    resource_map_ops!(
        get_consent,
        put_consent,
        list_consents,
        remove_consent,
        consents,
        Consent,
        "Consent"
    );
    resource_map_ops!(
        get_verification_result,
        put_verification_result,
        list_verification_results,
        remove_verification_result,
        verification_results,
        VerificationResult,
        "VerificationResult"
    );

    /// Finds the endpoint whose `address` matches exactly (RFC 8707 resource
    /// indicator matching is exact, never prefix — see SPEC_FULL.md §9).
    pub async fn find_endpoint_by_address(&self, address: &str) -> Option<Endpoint> {
        self.endpoints
            .read()
            .await
            .values()
            .find(|e| e.address == address)
            .cloned()
    }

    /// Whether `org_id` manages an endpoint whose address is `address` (I6,
    /// and the introspection audience check in §4.1).
    pub async fn org_manages_endpoint(&self, org_id: &str, address: &str) -> bool {
        self.endpoints
            .read()
            .await
            .values()
            .any(|e| e.address == address && e.managing_organization.id == org_id)
    }

    /// Whether `org_id` manages at least one endpoint at all — used to
    /// reject an introspecting caller that was never registered as a data
    /// source, distinct from an audience mismatch on a specific token.
    pub async fn organization_has_endpoint(&self, org_id: &str) -> bool {
        self.endpoints
            .read()
            .await
            .values()
            .any(|e| e.managing_organization.id == org_id)
    }

    /// The PCM admin organization, if seeded (there must be exactly one).
    pub async fn admin_organization(&self) -> Option<Organization> {
        self.organizations
            .read()
            .await
            .values()
            .find(|o| o.is_admin())
            .cloned()
    }
}
