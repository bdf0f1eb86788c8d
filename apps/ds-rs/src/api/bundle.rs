//! `GET /fhir/Bundle`: the DS-RS's single operation (§4.4).

use axum::Json;
use serde_json::Value;

use crate::jwt::LocalClaims;
use crate::observation::mock_bundle;

pub async fn read_bundle(claims: LocalClaims) -> Json<Value> {
    Json(mock_bundle(&claims.patient))
}
