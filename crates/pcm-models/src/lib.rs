//! Resource and token models shared by the PCM authorization/resource server,
//! the DS policy enforcement point, and the DS resource server.
//!
//! # Module organization
//!
//! - `identifier`: business identifiers, coded concepts, and `Type/id` references
//! - `organization`, `endpoint`, `healthcare_service`, `consent`, `verification_result`:
//!   the five resource kinds that make up the authorization graph
//! - `bundle`: search-result and `_include` wire format
//! - `token`: the opaque access token record and its wire projections
//! - `systems`: the fixed identifier/extension/code systems used across the wire

pub mod bundle;
pub mod consent;
pub mod endpoint;
pub mod error;
pub mod healthcare_service;
pub mod identifier;
pub mod organization;
pub mod systems;
pub mod thumbprint;
pub mod token;
pub mod verification_result;

pub use bundle::{Bundle, BundleEntry, BundleEntrySearch, BundleType, SearchMode};
pub use consent::{Consent, ConsentActor, ConsentRole, ConsentStatus};
pub use endpoint::Endpoint;
pub use error::{Error, Result};
pub use healthcare_service::{HealthcareService, ServiceTag};
pub use identifier::{Identifier, Reference};
pub use organization::{Organization, OrgType};
pub use token::{Cnf, FhirContextEntry, TokenRecord};
pub use verification_result::VerificationResult;
