//! Integration test for `GET /fhir/Bundle` (§4.4, §8 T7/scenario 5).

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use ds_rs::config::{Config, LocalTokenConfig, LoggingConfig, ServerConfig};
use ds_rs::state::AppState;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::Serialize;
use serde_json::Value;
use tower::ServiceExt;

const HMAC_SECRET: &str = "shared-test-secret";

#[derive(Serialize)]
struct LocalClaims {
    sub: String,
    scope: String,
    iss: String,
    aud: String,
    patient: String,
    exp: i64,
}

fn test_config() -> Config {
    Config {
        server: ServerConfig {
            listen_addr: "127.0.0.1:0".parse().unwrap(),
        },
        local_token: LocalTokenConfig {
            hmac_secret: HMAC_SECRET.to_string(),
        },
        logging: LoggingConfig {
            deployment_environment: "test".to_string(),
            json: false,
        },
    }
}

fn mint(patient: &str, exp: i64) -> String {
    let claims = LocalClaims {
        sub: "client-org-sp".to_string(),
        scope: "patient/Observation.rs".to_string(),
        iss: "client-org-sp".to_string(),
        aud: "https://ds-gw:8080/fhir".to_string(),
        patient: patient.to_string(),
        exp,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(HMAC_SECRET.as_bytes()),
    )
    .unwrap()
}

#[tokio::test]
async fn missing_bearer_is_rejected() {
    let state = AppState::new(test_config());
    let app = ds_rs::api::build_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/fhir/Bundle")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn wrong_secret_is_rejected() {
    let state = AppState::new(test_config());
    let app = ds_rs::api::build_router(state);

    let bad_token = encode(
        &Header::default(),
        &LocalClaims {
            sub: "x".into(),
            scope: "x".into(),
            iss: "x".into(),
            aud: "x".into(),
            patient: "Patient/abc".into(),
            exp: 9_999_999_999,
        },
        &EncodingKey::from_secret(b"not-the-shared-secret"),
    )
    .unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/fhir/Bundle")
                .header("authorization", format!("Bearer {bad_token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn valid_local_token_returns_bundle_keyed_by_patient() {
    let state = AppState::new(test_config());
    let app = ds_rs::api::build_router(state);

    let patient_ref =
        "Patient/a665a45920422f9d417e4867efdc4fb8a04a1f3fff1fa07e998e86f7f7a27ae3";
    let token = mint(patient_ref, 9_999_999_999);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/fhir/Bundle")
                .header("authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let bundle: Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(bundle["resourceType"], "Bundle");
    assert_eq!(bundle["total"], 1);
    assert_eq!(
        bundle["entry"][0]["resource"]["subject"]["reference"],
        patient_ref
    );
}
