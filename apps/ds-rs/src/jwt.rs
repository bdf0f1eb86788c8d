//! Verifies the PEP-minted local JWT; rejects any other bearer (§4.4).

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use crate::error::Error;
use crate::state::AppState;

#[derive(Debug, Clone, Deserialize)]
pub struct LocalClaims {
    pub sub: String,
    #[allow(dead_code)]
    pub scope: String,
    #[allow(dead_code)]
    pub iss: String,
    #[allow(dead_code)]
    pub aud: String,
    pub patient: String,
    #[serde(default, rename = "fhirContext")]
    #[allow(dead_code)]
    pub fhir_context: Vec<serde_json::Value>,
    pub exp: i64,
}

impl FromRequestParts<AppState> for LocalClaims {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or(Error::MissingBearer)?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["sub", "patient", "exp"]);

        let key = DecodingKey::from_secret(state.config.local_token.hmac_secret.as_bytes());
        decode::<LocalClaims>(token, &key, &validation)
            .map(|data| data.claims)
            .map_err(|_| Error::InvalidToken)
    }
}
