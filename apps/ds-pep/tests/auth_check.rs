//! Integration test for `GET /auth-check` (§4.3, §8 scenario 5), driving
//! the real router via `tower::ServiceExt::oneshot` against a `wiremock`
//! stand-in for PCM (§10.5).

use std::net::SocketAddr;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use ds_pep::config::{Config, LocalTokenConfig, LoggingConfig, PcmConfig, ServerConfig};
use ds_pep::state::AppState;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use serde_json::json;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TEST_CERT_PEM: &str = include_str!("fixtures/test-client-cert.pem");
const TEST_KEY_PEM: &str = include_str!("fixtures/test-client-key.pem");

#[derive(Debug, Deserialize)]
struct LocalClaims {
    sub: String,
    patient: String,
    #[allow(dead_code)]
    exp: i64,
}

async fn test_config(pcm_base_url: &str, cert_dir: &std::path::Path) -> Config {
    let cert_path = cert_dir.join("cert.pem");
    let key_path = cert_dir.join("key.pem");
    std::fs::write(&cert_path, TEST_CERT_PEM).unwrap();
    std::fs::write(&key_path, TEST_KEY_PEM).unwrap();

    Config {
        server: ServerConfig {
            listen_addr: "127.0.0.1:0".parse::<SocketAddr>().unwrap(),
        },
        pcm: PcmConfig {
            base_url: pcm_base_url.to_string(),
            introspection_endpoint_fallback: format!("{pcm_base_url}/introspect"),
            client_id: "client-ds-pep".to_string(),
            client_key_path: key_path.to_string_lossy().to_string(),
            client_cert_path: cert_path.to_string_lossy().to_string(),
            trust_ca_path: cert_path.to_string_lossy().to_string(),
        },
        local_token: LocalTokenConfig {
            hmac_secret: "test-shared-secret".to_string(),
            ttl_seconds: 30,
        },
        logging: LoggingConfig {
            deployment_environment: "test".to_string(),
            json: false,
        },
    }
}

async fn mount_pcm_mocks(server: &MockServer, active: bool) {
    Mock::given(method("GET"))
        .and(path("/r4/.well-known/smart-configuration"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "introspection_endpoint": format!("{}/introspect", server.uri()),
        })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "pep-own-access-token",
            "token_type": "Bearer",
            "expires_in": 30,
            "scope": "introspection",
        })))
        .mount(server)
        .await;

    let introspect_body = if active {
        json!({
            "active": true,
            "sub": "client-org-sp",
            "scope": "patient/Observation.rs?_security=http://fhir.health.gov.il/cs/hdp-information-buckets|laboratoryTests&date=ge2024-01-01",
            "iss": "client-org-sp",
            "aud": "https://ds-gw:8080/fhir",
            "patient": "http://fhir.health.gov.il/identifier/il-national-id|123",
            "fhirContext": [],
            "cnf": { "x5t#S256": "irrelevant-for-this-test" },
            "exp": 9_999_999_999i64,
            "iat": 1_700_000_000i64,
        })
    } else {
        json!({ "active": false })
    };

    Mock::given(method("POST"))
        .and(path("/introspect"))
        .respond_with(ResponseTemplate::new(200).set_body_json(introspect_body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn missing_bearer_is_rejected() {
    let mock_server = MockServer::start().await;
    let cert_dir = tempfile::tempdir().unwrap();
    let config = test_config(&mock_server.uri(), cert_dir.path()).await;
    let state = AppState::new(config).unwrap();
    let app = ds_pep::api::build_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/auth-check")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn active_token_yields_local_jwt_with_hashed_patient() {
    let mock_server = MockServer::start().await;
    mount_pcm_mocks(&mock_server, true).await;

    let cert_dir = tempfile::tempdir().unwrap();
    let config = test_config(&mock_server.uri(), cert_dir.path()).await;
    let hmac_secret = config.local_token.hmac_secret.clone();
    let state = AppState::new(config).unwrap();
    let app = ds_pep::api::build_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/auth-check")
                .header("authorization", "Bearer external-pcm-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let local_token = response
        .headers()
        .get("x-local-token")
        .expect("X-Local-Token header present")
        .to_str()
        .unwrap()
        .to_string();

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    let claims = decode::<LocalClaims>(
        &local_token,
        &DecodingKey::from_secret(hmac_secret.as_bytes()),
        &validation,
    )
    .unwrap()
    .claims;

    assert_eq!(claims.sub, "client-org-sp");
    assert_eq!(
        claims.patient,
        "Patient/a665a45920422f9d417e4867efdc4fb8a04a1f3fff1fa07e998e86f7f7a27ae3"
    );

    let _ = to_bytes(response.into_body(), usize::MAX).await.unwrap();
}

#[tokio::test]
async fn inactive_token_is_rejected() {
    let mock_server = MockServer::start().await;
    mount_pcm_mocks(&mock_server, false).await;

    let cert_dir = tempfile::tempdir().unwrap();
    let config = test_config(&mock_server.uri(), cert_dir.path()).await;
    let state = AppState::new(config).unwrap();
    let app = ds_pep::api::build_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/auth-check")
                .header("authorization", "Bearer expired-or-unknown")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
