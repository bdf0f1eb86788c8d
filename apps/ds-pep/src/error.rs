//! The PEP speaks one surface only: OAuth-style JSON errors, since its
//! single route (`/auth-check`) is itself a gateway sub-request rather
//! than a FHIR-facing one (§4.3, §7).

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("missing or malformed bearer token")]
    MissingBearer,

    #[error("token is not active")]
    TokenInactive,

    #[error("PCM is unreachable: {0}")]
    PcmUnreachable(String),

    #[error("patient identity missing or malformed in introspection response")]
    MalformedPatientIdentity,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            Error::MissingBearer => (StatusCode::UNAUTHORIZED, "access_denied", self.to_string()),
            Error::TokenInactive => (StatusCode::UNAUTHORIZED, "access_denied", self.to_string()),
            Error::PcmUnreachable(_) => (StatusCode::UNAUTHORIZED, "access_denied", self.to_string()),
            Error::MalformedPatientIdentity => {
                (StatusCode::UNAUTHORIZED, "access_denied", self.to_string())
            }
            Error::Other(_) => {
                tracing::error!(error = %self, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "server_error",
                    "internal server error".to_string(),
                )
            }
        };

        let mut response = (
            status,
            Json(json!({ "error": code, "error_description": message })),
        )
            .into_response();
        response
            .headers_mut()
            .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
        response
    }
}
