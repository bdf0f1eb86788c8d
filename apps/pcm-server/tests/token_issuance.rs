//! `POST /token`: scenarios 1-3 and invariants T1-T3 (§4.1, §8).

mod support;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use pcm_models::systems::{DS_DATA_SCOPE, JWT_BEARER_ASSERTION_TYPE};
use serde_json::{json, Value};
use tower::ServiceExt;

use support::*;

fn token_request(form: String, thumbprint: Option<String>) -> Request<Body> {
    with_peer_cert(
        Request::builder()
            .method("POST")
            .uri("/token")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from(form))
            .unwrap(),
        thumbprint,
    )
}

#[tokio::test]
async fn b2b_assertion_for_an_active_consent_yields_a_ds_data_scope_token_with_fhir_context() {
    let seed = write_seed_file();
    let state = build_state(seed.path()).await;
    let app = pcm_server::api::build_router(state);

    let assertion = sign_assertion(
        "client-org-sp",
        "client-org-sp-key.pem",
        None,
        Some(json!({
            "organization_id": "org-sp",
            "consent_reference": ["consent-1"],
        })),
    );
    let thumbprint = cert_thumbprint("client-org-sp-cert.pem");

    let form = form_body(&[
        ("grant_type", "client_credentials"),
        ("client_assertion_type", JWT_BEARER_ASSERTION_TYPE),
        ("client_assertion", &assertion),
        ("resource", "https://ds-gw:8080/fhir"),
    ]);

    let response = app
        .oneshot(token_request(form, Some(thumbprint)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let payload: Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(payload["scope"], DS_DATA_SCOPE);
    assert_eq!(payload["token_type"], "Bearer");
    assert!(payload["access_token"].as_str().unwrap().len() > 0);
}

#[tokio::test]
async fn consent_not_bound_to_the_requesting_organization_is_denied() {
    let seed = write_seed_file();
    let state = build_state(seed.path()).await;
    let app = pcm_server::api::build_router(state);

    // Hospital B is not a party to consent-1 (only org-sp and
    // org-vaccine-repo are), so asserting on its behalf must be refused
    // even with an otherwise well-formed assertion (T1, scenario 2).
    let assertion = sign_assertion(
        "client-org-hospital-b-sp",
        "client-org-hospital-b-sp-key.pem",
        None,
        Some(json!({
            "organization_id": "org-hospital-b-sp",
            "consent_reference": ["consent-1"],
        })),
    );
    let thumbprint = cert_thumbprint("client-org-hospital-b-sp-cert.pem");

    let form = form_body(&[
        ("grant_type", "client_credentials"),
        ("client_assertion_type", JWT_BEARER_ASSERTION_TYPE),
        ("client_assertion", &assertion),
        ("resource", "https://ds-gw:8080/fhir"),
    ]);

    let response = app
        .oneshot(token_request(form, Some(thumbprint)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn resource_not_owned_by_any_consent_custodian_is_rejected_as_invalid_target() {
    let seed = write_seed_file();
    let state = build_state(seed.path()).await;
    let app = pcm_server::api::build_router(state);

    let assertion = sign_assertion(
        "client-org-sp",
        "client-org-sp-key.pem",
        None,
        Some(json!({
            "organization_id": "org-sp",
            "consent_reference": ["consent-1"],
        })),
    );
    let thumbprint = cert_thumbprint("client-org-sp-cert.pem");

    // consent-1's only CST is org-vaccine-repo, which owns
    // ep-vaccine-repo, not this resource (T3, scenario 3).
    let form = form_body(&[
        ("grant_type", "client_credentials"),
        ("client_assertion_type", JWT_BEARER_ASSERTION_TYPE),
        ("client_assertion", &assertion),
        ("resource", "https://unrelated-gateway:9090/fhir"),
    ]);

    let response = app
        .oneshot(token_request(form, Some(thumbprint)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let payload: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(payload["error"], "invalid_target");
}

#[tokio::test]
async fn assertion_audience_mismatch_is_rejected() {
    let seed = write_seed_file();
    let state = build_state(seed.path()).await;
    let app = pcm_server::api::build_router(state);

    let assertion = sign_assertion(
        "client-org-sp",
        "client-org-sp-key.pem",
        Some("https://wrong-host/token"),
        None,
    );
    let thumbprint = cert_thumbprint("client-org-sp-cert.pem");

    let form = form_body(&[
        ("grant_type", "client_credentials"),
        ("client_assertion_type", JWT_BEARER_ASSERTION_TYPE),
        ("client_assertion", &assertion),
        ("resource", "https://ds-gw:8080/fhir"),
    ]);

    let response = app
        .oneshot(token_request(form, Some(thumbprint)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn missing_mtls_peer_certificate_is_rejected_before_the_handler_runs() {
    let seed = write_seed_file();
    let state = build_state(seed.path()).await;
    let app = pcm_server::api::build_router(state);

    let assertion = sign_assertion("client-org-sp", "client-org-sp-key.pem", None, None);
    let form = form_body(&[
        ("grant_type", "client_credentials"),
        ("client_assertion_type", JWT_BEARER_ASSERTION_TYPE),
        ("client_assertion", &assertion),
        ("resource", "https://ds-gw:8080/fhir"),
    ]);

    let response = app.oneshot(token_request(form, None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unregistered_client_id_is_rejected() {
    let seed = write_seed_file();
    let state = build_state(seed.path()).await;
    let app = pcm_server::api::build_router(state);

    let assertion = sign_assertion("client-unregistered", "client-unregistered-key.pem", None, None);
    let thumbprint = cert_thumbprint("client-unregistered-cert.pem");

    let form = form_body(&[
        ("grant_type", "client_credentials"),
        ("client_assertion_type", JWT_BEARER_ASSERTION_TYPE),
        ("client_assertion", &assertion),
        ("resource", "https://ds-gw:8080/fhir"),
    ]);

    let response = app
        .oneshot(token_request(form, Some(thumbprint)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn system_scope_request_outside_the_clients_allowed_scopes_is_rejected() {
    let seed = write_seed_file();
    let state = build_state(seed.path()).await;
    let app = pcm_server::api::build_router(state);

    let assertion = sign_assertion("client-org-sp", "client-org-sp-key.pem", None, None);
    let thumbprint = cert_thumbprint("client-org-sp-cert.pem");

    // org-sp's client is only registered for system/*.cruds, not introspection.
    let form = form_body(&[
        ("grant_type", "client_credentials"),
        ("client_assertion_type", JWT_BEARER_ASSERTION_TYPE),
        ("client_assertion", &assertion),
        ("resource", "https://ds-gw:8080/fhir"),
        ("scope", "introspection"),
    ]);

    let response = app
        .oneshot(token_request(form, Some(thumbprint)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
