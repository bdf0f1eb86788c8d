//! RS256 client-assertion verification (§4.1 steps 4-6).
//!
//! The registered client certificate PEM doubles as the assertion-signing
//! key per §4.1 step 5. `jsonwebtoken` only accepts a raw RSA/EC public
//! key, not an X.509 certificate, so the certificate's
//! `SubjectPublicKeyInfo` is pulled out with `x509-parser` first — for an
//! `rsaEncryption` key the SPKI bit-string content is exactly the PKCS#1
//! `RSAPublicKey` DER `jsonwebtoken::DecodingKey::from_rsa_der` expects.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use crate::error::{Error, OAuthErrorCode};

#[derive(Debug, Clone, Deserialize)]
pub struct ClientAssertionClaims {
    pub sub: String,
    pub iss: String,
    pub aud: String,
    pub exp: i64,
    #[serde(default)]
    pub extensions: Option<AssertionExtensions>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssertionExtensions {
    #[serde(rename = "hl7-b2b")]
    pub hl7_b2b: Option<B2bExtension>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct B2bExtension {
    pub organization_id: String,
    #[serde(default)]
    pub purpose_of_use: Option<String>,
    #[serde(default)]
    pub consent_reference: Vec<String>,
}

fn invalid_client(description: impl Into<String>) -> Error {
    Error::oauth(
        axum::http::StatusCode::UNAUTHORIZED,
        OAuthErrorCode::InvalidClient,
        description,
    )
}

fn rsa_decoding_key_from_cert_pem(cert_pem: &[u8]) -> Result<DecodingKey, Error> {
    let mut reader = std::io::BufReader::new(cert_pem);
    let der = rustls_pemfile::certs(&mut reader)
        .next()
        .ok_or_else(|| invalid_client("registered client certificate is not valid PEM"))?
        .map_err(|_| invalid_client("registered client certificate is not valid PEM"))?;

    let (_, parsed) = x509_parser::parse_x509_certificate(der.as_ref())
        .map_err(|_| invalid_client("registered client certificate could not be parsed"))?;

    let spki = parsed.public_key();
    Ok(DecodingKey::from_rsa_der(spki.subject_public_key.data.as_ref()))
}

/// Verifies `assertion` was signed by the key in `client_cert_pem` and that
/// its `aud` is one of `accepted_audiences`. Does not check `sub == iss`
/// against a known client id — the caller does that once it has resolved
/// which client registered `cert_pem` in the first place.
pub fn verify_client_assertion(
    assertion: &str,
    client_cert_pem: &[u8],
    accepted_audiences: &[String],
) -> Result<ClientAssertionClaims, Error> {
    let header = jsonwebtoken::decode_header(assertion)
        .map_err(|e| invalid_client(format!("malformed client assertion: {e}")))?;
    if header.alg != Algorithm::RS256 {
        return Err(invalid_client("client assertion must use RS256"));
    }

    let key = rsa_decoding_key_from_cert_pem(client_cert_pem)?;

    let mut validation = Validation::new(Algorithm::RS256);
    validation.set_audience(accepted_audiences);
    validation.set_required_spec_claims(&["sub", "iss", "aud", "exp"]);

    let data = decode::<ClientAssertionClaims>(assertion, &key, &validation)
        .map_err(|e| invalid_client(format!("client assertion verification failed: {e}")))?;
    Ok(data.claims)
}
