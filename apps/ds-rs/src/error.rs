//! A FHIR-facing error surface — this binary only ever serves
//! `GET /fhir/Bundle` and rejects with an `OperationOutcome`, matching the
//! RS-side rendering the PCM Resource Server uses for the same cases (§7).

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

    #[error("local token is invalid or expired")]
    InvalidToken,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            Error::MissingBearer => (StatusCode::UNAUTHORIZED, "login"),
            Error::InvalidToken => (StatusCode::UNAUTHORIZED, "login"),
            Error::Other(_) => {
                tracing::error!(error = %self, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "exception")
            }
        };

        let body = Json(json!({
            "resourceType": "OperationOutcome",
            "issue": [{
                "severity": "error",
                "code": code,
                "diagnostics": self.to_string(),
            }]
        }));

        let mut response = (status, body).into_response();
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/fhir+json; charset=utf-8"),
        );
        response
            .headers_mut()
            .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
        response
    }
}
