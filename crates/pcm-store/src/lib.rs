//! In-memory stores backing the PCM authorization substrate.
//!
//! Two independent stores live here, mirroring §5 of SPEC_FULL.md:
//!
//! - [`FhirStore`]: the Organization/Endpoint/HealthcareService/Consent/
//!   VerificationResult graph, shared by the AS (for B2B binding lookups)
//!   and the RS (for CRUD/search).
//! - [`TokenStore`]: the opaque-token map the AS mints into and introspects
//!   out of.
//!
//! Both are guarded with `tokio::sync::RwLock` rather than a generic trait
//! over JSON, since every authorization rule in this system is specific to
//! one of the five resource kinds above.

pub mod error;
pub mod fhir_store;
pub mod include;
pub mod seed;
pub mod token_store;

pub use error::{Error, Result};
pub use fhir_store::FhirStore;
pub use include::{IncludeDirective, IncludeKind, IncludedResource};
pub use seed::{BootstrapSeed, ClientRecord};
pub use token_store::TokenStore;
