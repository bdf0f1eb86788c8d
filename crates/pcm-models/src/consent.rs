//! The `Consent` resource and its state machine.
//!
//! Transitions: `proposed -> active` and `proposed -> rejected` are driven by
//! the UI-approval collaborator (§10.4 of SPEC_FULL.md exposes this as an
//! internal admin-gated route rather than re-implementing the UI itself);
//! `active -> inactive` is the only transition a non-admin requester may make
//! (I3); the PCM admin organization may set any field/state (I4).

use serde::{Deserialize, Serialize};

use crate::identifier::{Identifier, Reference};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsentStatus {
    Proposed,
    Active,
    Inactive,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsentRole {
    /// Information Recipient — the requesting Service Provider.
    Ircp,
    /// Custodian — the Data Source organization holding the data.
    Cst,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentActor {
    pub role: ConsentRole,
    pub reference: Reference,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Consent {
    pub id: String,
    pub identifier: Identifier,
    pub status: ConsentStatus,
    pub patient_identifier: Identifier,
    pub actor: Vec<ConsentActor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pcm_service: Option<Reference>,
}

/// A transition a caller is trying to perform against a consent's mutable
/// fields; everything not modeled here is rejected as "any other change".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsentEdit {
    /// Only the status changed, and nothing else.
    StatusOnly(ConsentStatus),
    /// Any other shape of change (field edits, actor edits, multi-field).
    Other,
}

impl Consent {
    pub fn reference(&self) -> Reference {
        Reference::new("Consent", &self.id)
    }

    pub fn ircp_actor(&self) -> Option<&ConsentActor> {
        self.actor.iter().find(|a| a.role == ConsentRole::Ircp)
    }

    pub fn cst_actors(&self) -> impl Iterator<Item = &ConsentActor> {
        self.actor.iter().filter(|a| a.role == ConsentRole::Cst)
    }

    /// Whether `org` (by reference) appears as an actor in any role (I5).
    pub fn has_actor(&self, org: &Reference) -> bool {
        self.actor.iter().any(|a| &a.reference == org)
    }

    /// Validates a requested edit against (I3)/(I4): the PCM admin may
    /// perform any edit; any other caller may only flip `active -> inactive`
    /// and only if they are the IRCP actor.
    pub fn authorize_update(
        &self,
        caller_is_admin: bool,
        caller_is_ircp: bool,
        edit: &ConsentEdit,
    ) -> bool {
        if caller_is_admin {
            return true;
        }
        caller_is_ircp
            && self.status == ConsentStatus::Active
            && matches!(edit, ConsentEdit::StatusOnly(ConsentStatus::Inactive))
    }
}
