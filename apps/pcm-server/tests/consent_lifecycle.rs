//! Consent CRUD visibility and the admin-gated `$approve`/`$reject`
//! transitions (§4.2, §9, §10.4).

mod support;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use support::*;

fn authed(method: &str, uri: &str, bearer: &str, body: Body) -> Request<Body> {
    with_peer_cert(
        Request::builder()
            .method(method)
            .uri(uri)
            .header("authorization", format!("Bearer {bearer}"))
            .header("content-type", "application/json")
            .body(body)
            .unwrap(),
        Some("thumb".to_string()),
    )
}

#[tokio::test]
async fn admin_client_can_approve_a_proposed_consent() {
    let seed = write_seed_file();
    let state = build_state(seed.path()).await;
    seed_token(&state, "admin-token", "client-org-pcm-admin", "org-pcm", "system/*.cruds").await;
    let app = pcm_server::api::build_router(state);

    let body = Body::from(json!({ "cst_organization_id": "org-vaccine-repo" }).to_string());
    let response = app
        .oneshot(authed(
            "POST",
            "/r4/Consent/consent-proposed/$approve",
            "admin-token",
            body,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let consent: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(consent["status"], "active");
}

#[tokio::test]
async fn non_admin_client_cannot_approve_a_consent() {
    let seed = write_seed_file();
    let state = build_state(seed.path()).await;
    seed_token(&state, "sp-token", "client-org-sp", "org-sp", "system/*.cruds").await;
    let app = pcm_server::api::build_router(state);

    let body = Body::from(json!({ "cst_organization_id": "org-vaccine-repo" }).to_string());
    let response = app
        .oneshot(authed(
            "POST",
            "/r4/Consent/consent-proposed/$approve",
            "sp-token",
            body,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_client_can_reject_a_proposed_consent() {
    let seed = write_seed_file();
    let state = build_state(seed.path()).await;
    seed_token(&state, "admin-token", "client-org-pcm-admin", "org-pcm", "system/*.cruds").await;
    let app = pcm_server::api::build_router(state);

    let response = app
        .oneshot(authed(
            "POST",
            "/r4/Consent/consent-proposed/$reject",
            "admin-token",
            Body::empty(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let consent: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(consent["status"], "rejected");
}

#[tokio::test]
async fn approving_a_consent_that_is_not_proposed_is_rejected() {
    let seed = write_seed_file();
    let state = build_state(seed.path()).await;
    seed_token(&state, "admin-token", "client-org-pcm-admin", "org-pcm", "system/*.cruds").await;
    let app = pcm_server::api::build_router(state);

    // consent-1 is already active.
    let body = Body::from(json!({ "cst_organization_id": "org-vaccine-repo" }).to_string());
    let response = app
        .oneshot(authed("POST", "/r4/Consent/consent-1/$approve", "admin-token", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn approving_with_a_non_source_cst_organization_is_rejected() {
    let seed = write_seed_file();
    let state = build_state(seed.path()).await;
    seed_token(&state, "admin-token", "client-org-pcm-admin", "org-pcm", "system/*.cruds").await;
    let app = pcm_server::api::build_router(state);

    // org-hospital-b-sp is type service-provider, not source, so it may
    // never be installed as a consent's custodian (I2).
    let body = Body::from(json!({ "cst_organization_id": "org-hospital-b-sp" }).to_string());
    let response = app
        .oneshot(authed(
            "POST",
            "/r4/Consent/consent-proposed/$approve",
            "admin-token",
            body,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn consent_search_is_scoped_to_the_callers_own_actor_role() {
    let seed = write_seed_file();
    let state = build_state(seed.path()).await;
    // org-hospital-b-sp is party to no consent in the seed.
    seed_token(
        &state,
        "hospital-b-token",
        "client-org-hospital-b-sp",
        "org-hospital-b-sp",
        "system/*.cruds",
    )
    .await;
    let app = pcm_server::api::build_router(state);

    let response = app
        .oneshot(authed("GET", "/r4/Consent", "hospital-b-token", Body::empty()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let bundle: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(bundle["entry"].as_array().map(|e| e.len()).unwrap_or(0), 0);
}

#[tokio::test]
async fn consent_search_returns_the_callers_own_consents() {
    let seed = write_seed_file();
    let state = build_state(seed.path()).await;
    seed_token(&state, "sp-token", "client-org-sp", "org-sp", "system/*.cruds").await;
    let app = pcm_server::api::build_router(state);

    let response = app
        .oneshot(authed("GET", "/r4/Consent", "sp-token", Body::empty()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let bundle: Value = serde_json::from_slice(&bytes).unwrap();
    let ids: Vec<&str> = bundle["entry"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["resource"]["id"].as_str().unwrap())
        .collect();
    assert!(ids.contains(&"consent-1"));
    assert!(ids.contains(&"consent-proposed"));
}
