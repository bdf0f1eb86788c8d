//! Patient identity translation and local JWT minting (§4.3 step 6).

use jsonwebtoken::{EncodingKey, Header};
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::Error;
use crate::pcm_client::{IntrospectionCnf, IntrospectionResponse};

#[derive(Debug, Serialize)]
struct LocalClaims {
    sub: String,
    scope: String,
    iss: String,
    aud: String,
    jti: String,
    iat: i64,
    exp: i64,
    patient: String,
    #[serde(rename = "fhirContext", skip_serializing_if = "Vec::is_empty")]
    fhir_context: Vec<Value>,
    cnf: IntrospectionCnf,
}

/// `"Patient/" + lowercase-hex(SHA-256(value))`, where `value` is the part
/// of the introspection `patient` claim after the `|`.
pub fn hash_patient_id(identifier_pipe_form: &str) -> Result<String, Error> {
    let value = identifier_pipe_form
        .split_once('|')
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
        .ok_or(Error::MalformedPatientIdentity)?;

    let digest = Sha256::digest(value.as_bytes());
    Ok(format!("Patient/{}", hex::encode(digest)))
}

/// Mints the 30-second local JWT the gateway rewrites `Authorization` to
/// before forwarding to the DS Resource Server.
pub fn mint_local_token(
    hmac_secret: &[u8],
    ttl_seconds: i64,
    original_token: &str,
    introspection: &IntrospectionResponse,
    now: i64,
) -> Result<String, Error> {
    let IntrospectionResponse::Active {
        sub,
        scope,
        iss,
        aud,
        patient,
        fhir_context,
        cnf,
        ..
    } = introspection
    else {
        return Err(Error::TokenInactive);
    };

    let patient = patient.as_deref().ok_or(Error::MalformedPatientIdentity)?;
    let local_patient = hash_patient_id(patient)?;

    let claims = LocalClaims {
        sub: sub.clone(),
        scope: scope.clone(),
        iss: iss.clone(),
        aud: aud.clone(),
        jti: original_token.to_string(),
        iat: now,
        exp: now + ttl_seconds,
        patient: local_patient,
        fhir_context: fhir_context.clone(),
        cnf: cnf.clone(),
    };

    let key = EncodingKey::from_secret(hmac_secret);
    jsonwebtoken::encode(&Header::default(), &claims, &key)
        .map_err(|e| Error::Other(anyhow::anyhow!("failed to mint local token: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_match_known_vector() {
        let hashed =
            hash_patient_id("http://fhir.health.gov.il/identifier/il-national-id|123").unwrap();
        assert_eq!(
            hashed,
            "Patient/a665a45920422f9d417e4867efdc4fb8a04a1f3fff1fa07e998e86f7f7a27ae3"
        );
    }

    #[test]
    fn rejects_missing_pipe() {
        assert!(hash_patient_id("no-pipe-here").is_err());
    }
}
