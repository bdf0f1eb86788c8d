//! Shared test fixtures: a seed pointing registered clients at the RSA
//! identities under `tests/fixtures/`, a config built around it, and the
//! helpers scenario tests need to sign client assertions and simulate the
//! mTLS peer-certificate extension `PeerCertAcceptor` would normally
//! insert (§10.5 notes that integration tests generate their own client
//! identities rather than reusing the default seed's placeholder paths).

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use axum::body::Body;
use axum::http::Request;
use jsonwebtoken::{encode, EncodingKey, Header};
use pcm_server::config::{AdminConfig, Config, LoggingConfig, SeedConfig, ServerConfig, TlsConfig, TokenConfig};
use pcm_server::state::AppState;
use pcm_server::tls::PeerCertThumbprint;
use serde::Serialize;
use serde_json::{json, Value};
use tempfile::NamedTempFile;

pub const BASE_URL: &str = "https://pcm.example";

pub fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

/// Writes a seed TOML identical in shape to the shipped default, except
/// client `cert_path`s point at this crate's test fixtures and a second,
/// `proposed` consent is added for the admin approve/reject tests.
pub fn write_seed_file() -> NamedTempFile {
    let sp_cert = fixture_path("client-org-sp-cert.pem");
    let hb_cert = fixture_path("client-org-hospital-b-sp-cert.pem");
    let admin_cert = fixture_path("client-org-pcm-admin-cert.pem");

    let toml = format!(
        r#"
[[organizations]]
id = "org-pcm"
name = "Patient Consent Manager"
type = ["pcm"]

[[organizations]]
id = "org-sp"
name = "Community Clinic Service Provider"
type = ["service-provider"]
identifier = "sp-001"

[[organizations]]
id = "org-vaccine-repo"
name = "National Vaccine Repository"
type = ["source"]
endpoint = ["ep-vaccine-repo"]

[[organizations]]
id = "org-hospital-b-sp"
name = "Hospital B"
type = ["service-provider"]

[[endpoints]]
id = "ep-vaccine-repo"
address = "https://ds-gw:8080/fhir"
managing_organization = "org-vaccine-repo"

[[healthcare_services]]
id = "service-1"
meta_tag = "catalog"
name = "Vaccination History"
catalog_identifier = "service-1"

[[healthcare_services]]
id = "service-1-instance"
meta_tag = "instance"
active = true
provided_by = "org-sp"
based_on_canonical = "service-1"

[[consents]]
id = "consent-1"
identifier = "scenario-1"
status = "active"
patient_identifier = "99887766"
pcm_service = "service-1-instance"

[[consents.actor]]
role = "Ircp"
reference = "org-sp"

[[consents.actor]]
role = "Cst"
reference = "org-vaccine-repo"

[[consents]]
id = "consent-proposed"
identifier = "scenario-approve"
status = "proposed"
patient_identifier = "55544433"

[[consents.actor]]
role = "Ircp"
reference = "org-sp"

[[clients]]
client_id = "client-org-sp"
cert_path = "{sp_cert}"
organization_id = "org-sp"
allowed_scopes = ["system/*.cruds"]

[[clients]]
client_id = "client-org-hospital-b-sp"
cert_path = "{hb_cert}"
organization_id = "org-hospital-b-sp"
allowed_scopes = ["system/*.cruds"]

[[clients]]
client_id = "client-org-pcm-admin"
cert_path = "{admin_cert}"
organization_id = "org-pcm"
allowed_scopes = ["system/*.cruds"]
"#,
        sp_cert = sp_cert.display(),
        hb_cert = hb_cert.display(),
        admin_cert = admin_cert.display(),
    );

    let file = NamedTempFile::new().expect("create temp seed file");
    std::fs::write(file.path(), toml).expect("write temp seed file");
    file
}

pub fn test_config(seed_path: &Path) -> Config {
    Config {
        server: ServerConfig {
            listen_addr: "127.0.0.1:0".parse().unwrap(),
            public_base_url: BASE_URL.to_string(),
            tls: TlsConfig {
                server_cert_path: "unused-in-tests".to_string(),
                server_key_path: "unused-in-tests".to_string(),
                client_ca_path: "unused-in-tests".to_string(),
            },
        },
        seed: SeedConfig {
            path: Some(seed_path.display().to_string()),
        },
        admin: AdminConfig {
            client_id: "client-org-pcm-admin".to_string(),
        },
        token: TokenConfig { ttl_seconds: 30 },
        logging: LoggingConfig {
            deployment_environment: "test".to_string(),
            json: false,
        },
    }
}

pub async fn build_state(seed_path: &Path) -> AppState {
    AppState::new(test_config(seed_path)).await.expect("build AppState")
}

fn now() -> i64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs() as i64
}

#[derive(Serialize)]
struct AssertionClaims {
    sub: String,
    iss: String,
    aud: String,
    exp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    extensions: Option<Value>,
}

/// Signs a client assertion with `client_id`'s private key, targeting the
/// default token endpoint unless `aud_override` is given (used to exercise
/// the audience-mismatch rejection).
pub fn sign_assertion(client_id: &str, key_fixture: &str, aud_override: Option<&str>, b2b: Option<Value>) -> String {
    let key_pem = std::fs::read(fixture_path(key_fixture)).expect("read fixture key");
    let key = EncodingKey::from_rsa_pem(&key_pem).expect("parse fixture RSA key");

    let aud = aud_override
        .map(str::to_string)
        .unwrap_or_else(|| format!("{BASE_URL}/token"));

    let extensions = b2b.map(|b2b| json!({ "hl7-b2b": b2b }));

    let claims = AssertionClaims {
        sub: client_id.to_string(),
        iss: client_id.to_string(),
        aud,
        exp: now() + 60,
        extensions,
    };
    encode(&Header::new(jsonwebtoken::Algorithm::RS256), &claims, &key).expect("sign assertion")
}

pub fn cert_thumbprint(cert_fixture: &str) -> String {
    let pem = std::fs::read(fixture_path(cert_fixture)).expect("read fixture cert");
    pcm_models::thumbprint::thumbprint_pem(&pem).expect("thumbprint fixture cert")
}

/// Builds a request carrying the `Option<PeerCertThumbprint>` extension
/// `PeerCertAcceptor` would have inserted at the TLS accept layer — which
/// `Router::oneshot` never runs, so tests simulate it directly.
pub fn with_peer_cert(request: Request<Body>, thumbprint: Option<String>) -> Request<Body> {
    let mut request = request;
    request
        .extensions_mut()
        .insert(thumbprint.map(PeerCertThumbprint));
    request
}

pub fn form_body(pairs: &[(&str, &str)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Inserts an already-active token record directly into the token store,
/// bypassing `/token` issuance for tests that only need an authenticated
/// `Principal` (e.g. Consent CRUD, approve/reject).
pub async fn seed_token(
    state: &AppState,
    token: &str,
    client_id: &str,
    organization_id: &str,
    scope: &str,
) {
    use pcm_models::token::Cnf;
    use pcm_models::TokenRecord;

    state
        .token_store
        .insert(TokenRecord {
            token: token.to_string(),
            sub: client_id.to_string(),
            organization_id: organization_id.to_string(),
            scope: scope.to_string(),
            iss: client_id.to_string(),
            aud: format!("{BASE_URL}/r4"),
            patient: None,
            fhir_context: vec![],
            cnf: Cnf {
                x5t_s256: "test-thumbprint".to_string(),
            },
            iat: now(),
            exp: now() + 3600,
        })
        .await;
}
