//! One handler module per FHIR-style resource kind (§4.2).

pub mod consent;
pub mod endpoint;
pub mod healthcare_service;
pub mod organization;
pub mod verification_result;
