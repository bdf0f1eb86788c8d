//! Fixed identifier, extension, and code systems used across the wire formats.
//!
//! These are constants, not configuration: every deployment of this core
//! speaks the same systems, the way a FHIR IG fixes its canonical URLs.

pub const CONSENT_ID_SYSTEM: &str = "http://pcm.fhir.health.gov.il/identifier/pcm-consent-id";
pub const ORG_ID_SYSTEM: &str = "http://pcm.fhir.health.gov.il/identifier/pcm-organization-id";
pub const PATIENT_ID_SYSTEM: &str = "http://fhir.health.gov.il/identifier/il-national-id";
pub const HEALTHCARE_SERVICE_CATALOG_ID_SYSTEM: &str =
    "http://pcm.fhir.health.gov.il/identifier/pcm-healthcareservice-catalog-id";
pub const ORG_TYPE_SYSTEM: &str = "http://fhir.health.gov.il/cs/pcm-org-type";
pub const PCM_SERVICE_EXTENSION: &str =
    "http://pcm.fhir.health.gov.il/StructureDefinition/ext-pcm-service";
pub const BASED_ON_CANONICAL_EXTENSION: &str =
    "http://pcm.fhir.health.gov.il/StructureDefinition/ext-based-on-canonical-healthcareservice";
pub const APPLICABLE_CERTIFICATES_EXTENSION: &str =
    "http://pcm.fhir.health.gov.il/StructureDefinition/ext-applicable-certificates";
pub const META_TAG_SYSTEM: &str = "http://pcm.fhir.health.gov.il/cs/pcm-meta-tag";

/// Scope granted on B2B (consent-bound) tokens, verbatim.
pub const DS_DATA_SCOPE: &str = "patient/Observation.rs?_security=http://fhir.health.gov.il/cs/hdp-information-buckets|laboratoryTests&date=ge2024-01-01";

/// Default scope for non-B2B (PCM-RS administrative) access.
pub const DEFAULT_SYSTEM_SCOPE: &str = "system/*.cruds";

/// Scope a PEP's own client-credentials token must carry to call `/introspect`.
pub const INTROSPECTION_SCOPE: &str = "introspection";

/// `client_assertion_type` required on `/token` requests.
pub const JWT_BEARER_ASSERTION_TYPE: &str =
    "urn:ietf:params:oauth:client-assertion-type:jwt-bearer";
