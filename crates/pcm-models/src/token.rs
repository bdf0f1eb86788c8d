//! The opaque access token record minted by the AS and returned verbatim by
//! introspection.

use serde::{Deserialize, Serialize};

use crate::identifier::Identifier;

/// Holder-of-key confirmation, RFC 7800's `cnf` claim restricted to the
/// `x5t#S256` member this system uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cnf {
    #[serde(rename = "x5t#S256")]
    pub x5t_s256: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum FhirContextType {
    Consent,
    HealthcareService,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FhirContextEntry {
    #[serde(rename = "type")]
    pub context_type: FhirContextType,
    pub identifier: Identifier,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub token: String,
    pub sub: String,
    pub organization_id: String,
    pub scope: String,
    pub iss: String,
    pub aud: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fhir_context: Vec<FhirContextEntry>,
    pub cnf: Cnf,
    pub iat: i64,
    pub exp: i64,
}

impl TokenRecord {
    pub fn is_expired(&self, now: i64) -> bool {
        self.exp < now
    }
}
