//! The `VerificationResult` resource.

use serde::{Deserialize, Serialize};

use crate::identifier::Reference;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub id: String,
    #[serde(default = "default_status")]
    pub status: String,
    pub validator: Vec<Reference>,
}

fn default_status() -> String {
    "validated".to_string()
}

impl VerificationResult {
    pub fn reference(&self) -> Reference {
        Reference::new("VerificationResult", &self.id)
    }
}
