//! The `Organization` resource: service providers, data sources, and the
//! single PCM administrative organization.

use serde::{Deserialize, Serialize};

use crate::identifier::{Identifier, Reference};
use crate::systems::ORG_TYPE_SYSTEM;

/// Organization type codes, drawn from a fixed code system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum OrgType {
    ParentOrg,
    ServiceProvider,
    Source,
    Pcm,
}

impl OrgType {
    pub fn code(self) -> &'static str {
        match self {
            OrgType::ParentOrg => "parent-org",
            OrgType::ServiceProvider => "service-provider",
            OrgType::Source => "source",
            OrgType::Pcm => "pcm",
        }
    }
}

/// A `{url: thumbprint}` entry under `ext-applicable-certificates`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ApplicableCertificates {
    pub thumbprints: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub id: String,
    pub active: bool,
    pub name: String,
    #[serde(rename = "type")]
    pub org_type: Vec<OrgType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<Identifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part_of: Option<Reference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub endpoint: Vec<Reference>,
    #[serde(default, skip_serializing_if = "ApplicableCertificates::is_empty")]
    pub applicable_certificates: ApplicableCertificates,
}

impl ApplicableCertificates {
    fn is_empty(&self) -> bool {
        self.thumbprints.is_empty()
    }
}

impl Organization {
    pub fn has_type(&self, t: OrgType) -> bool {
        self.org_type.contains(&t)
    }

    pub fn is_admin(&self) -> bool {
        self.has_type(OrgType::Pcm)
    }

    pub fn is_data_source(&self) -> bool {
        self.has_type(OrgType::Source)
    }

    pub fn reference(&self) -> Reference {
        Reference::new("Organization", &self.id)
    }

    /// Coding system used when rendering `type` to the FHIR-style wire JSON.
    pub const TYPE_SYSTEM: &'static str = ORG_TYPE_SYSTEM;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_only_for_pcm_type() {
        let org = Organization {
            id: "org-pcm".into(),
            active: true,
            name: "PCM".into(),
            org_type: vec![OrgType::Pcm],
            identifier: None,
            part_of: None,
            endpoint: vec![],
            applicable_certificates: ApplicableCertificates::default(),
        };
        assert!(org.is_admin());
        assert!(!org.is_data_source());
    }
}
