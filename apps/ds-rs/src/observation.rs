//! Deterministic mock `laboratoryTests` panel keyed by the mapped patient
//! id (§4.4). Only the Bundle's *shape* is in scope here — the actual
//! generator living in the Data Source is an external collaborator (§1).

use serde_json::{json, Value};
use sha2::{Digest, Sha256};

/// Synthesizes a stable `searchset` Bundle of one Observation for
/// `patient_reference` (e.g. `"Patient/<hash>"`).
pub fn mock_bundle(patient_reference: &str) -> Value {
    let observation_id = deterministic_id(patient_reference);

    json!({
        "resourceType": "Bundle",
        "type": "searchset",
        "total": 1,
        "entry": [{
            "search": { "mode": "match" },
            "resource": {
                "resourceType": "Observation",
                "id": observation_id,
                "status": "final",
                "category": [{
                    "coding": [{
                        "system": "http://terminology.hl7.org/CodeSystem/observation-category",
                        "code": "laboratory",
                    }],
                }],
                "code": {
                    "coding": [{
                        "system": "http://fhir.health.gov.il/cs/hdp-information-buckets",
                        "code": "laboratoryTests",
                    }],
                },
                "subject": { "reference": patient_reference },
                "effectiveDateTime": "2024-01-01T00:00:00Z",
                "valueString": "mock laboratory panel result",
            },
        }],
    })
}

fn deterministic_id(patient_reference: &str) -> String {
    let digest = Sha256::digest(patient_reference.as_bytes());
    hex::encode(&digest[..8])
}
