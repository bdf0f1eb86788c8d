//! The `Endpoint` resource: the canonical audience/resource-indicator for a
//! data source, and the unit the B2B resource-binding check (I6) matches on.

use serde::{Deserialize, Serialize};

use crate::identifier::Reference;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    pub id: String,
    /// Unique across endpoints; used as the OAuth `resource`/`aud` value.
    pub address: String,
    pub managing_organization: Reference,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub applicable_certificates: Vec<String>,
}

impl Endpoint {
    pub fn reference(&self) -> Reference {
        Reference::new("Endpoint", &self.id)
    }
}
