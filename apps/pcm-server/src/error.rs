//! A single error enum rendering both surfaces the core needs (§7, §10.3):
//! an OAuth-style JSON body for the AS's `/token` and `/introspect`, and a
//! FHIR `OperationOutcome` for everything under `/r4`.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// OAuth2 error codes used across `/token` and `/introspect` (§7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OAuthErrorCode {
    AccessDenied,
    UnsupportedGrantType,
    InvalidClient,
    InvalidRequest,
    InvalidGrant,
    UnauthorizedClient,
    InvalidTarget,
}

impl OAuthErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            Self::AccessDenied => "access_denied",
            Self::UnsupportedGrantType => "unsupported_grant_type",
            Self::InvalidClient => "invalid_client",
            Self::InvalidRequest => "invalid_request",
            Self::InvalidGrant => "invalid_grant",
            Self::UnauthorizedClient => "unauthorized_client",
            Self::InvalidTarget => "invalid_target",
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("mTLS client certificate required")]
    MtlsRequired,

    #[error("OAuth error [{code}]: {description}")]
    OAuth {
        status: StatusCode,
        code: OAuthErrorCode,
        description: String,
    },

    #[error("resource not found: {resource_type}/{id}")]
    NotFound { resource_type: &'static str, id: String },

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error(transparent)]
    Store(#[from] pcm_store::Error),

    #[error(transparent)]
    Model(#[from] pcm_models::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn oauth(status: StatusCode, code: OAuthErrorCode, description: impl Into<String>) -> Self {
        Self::OAuth {
            status,
            code,
            description: description.into(),
        }
    }
}

enum Surface {
    OAuth,
    Fhir,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let surface = match &self {
            Error::MtlsRequired | Error::OAuth { .. } => Surface::OAuth,
            _ => Surface::Fhir,
        };

        let (status, message) = match &self {
            Error::MtlsRequired => (StatusCode::UNAUTHORIZED, self.to_string()),
            Error::OAuth { status, description, .. } => (*status, description.clone()),
            Error::NotFound { .. } => (StatusCode::NOT_FOUND, self.to_string()),
            Error::Forbidden(_) => (StatusCode::FORBIDDEN, self.to_string()),
            Error::InvalidRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            Error::Unauthorized(_) => (StatusCode::UNAUTHORIZED, self.to_string()),
            Error::Store(pcm_store::Error::NotFound { .. }) => {
                (StatusCode::NOT_FOUND, self.to_string())
            }
            Error::Store(_) | Error::Model(_) | Error::Other(_) => {
                tracing::error!(error = %self, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_string())
            }
        };

        let mut response = match surface {
            Surface::OAuth => {
                let code = match &self {
                    Error::OAuth { code, .. } => code.as_str(),
                    Error::MtlsRequired => "access_denied",
                    _ => "server_error",
                };
                (
                    status,
                    Json(json!({ "error": code, "error_description": message })),
                )
                    .into_response()
            }
            Surface::Fhir => {
                let body = Json(json!({
                    "resourceType": "OperationOutcome",
                    "issue": [{
                        "severity": "error",
                        "code": status_to_fhir_code(status),
                        "diagnostics": message,
                    }]
                }));
                let mut response = (status, body).into_response();
                response.headers_mut().insert(
                    header::CONTENT_TYPE,
                    HeaderValue::from_static("application/fhir+json; charset=utf-8"),
                );
                response
            }
        };

        response.headers_mut().insert(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        );
        response
    }
}

fn status_to_fhir_code(status: StatusCode) -> &'static str {
    match status {
        StatusCode::BAD_REQUEST => "invalid",
        StatusCode::NOT_FOUND => "not-found",
        StatusCode::FORBIDDEN => "forbidden",
        StatusCode::UNAUTHORIZED => "login",
        _ => "exception",
    }
}
