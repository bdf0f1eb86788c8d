//! The `HealthcareService` resource: a PCM-managed `catalog` template and the
//! SP-owned `instance` linked to it via `basedOnCanonical`.

use serde::{Deserialize, Serialize};

use crate::identifier::{Identifier, Reference};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceTag {
    Catalog,
    Instance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthcareService {
    pub id: String,
    pub meta_tag: ServiceTag,
    #[serde(default)]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Set for `instance` resources; the SP organization that owns the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provided_by: Option<Reference>,
    /// Set for `catalog` resources: the catalog identifier under
    /// `HEALTHCARE_SERVICE_CATALOG_ID_SYSTEM`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_identifier: Option<Identifier>,
    /// Set for `instance` resources: the linked catalog entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub based_on_canonical: Option<Reference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub category: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub service_type: Vec<String>,
}

impl HealthcareService {
    pub fn reference(&self) -> Reference {
        Reference::new("HealthcareService", &self.id)
    }

    pub fn is_catalog(&self) -> bool {
        self.meta_tag == ServiceTag::Catalog
    }

    pub fn is_instance(&self) -> bool {
        self.meta_tag == ServiceTag::Instance
    }
}
