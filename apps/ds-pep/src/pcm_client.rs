//! A minimal PCM client: mints this PEP's own client assertion, exchanges
//! it for an introspection-scoped access token (cached), discovers the
//! introspection endpoint via SMART configuration (cached, with a
//! configured fallback), and calls `/introspect` (§4.3 steps 2-4).
//!
//! This is a separate binary's HTTP client, not a consumer of
//! `pcm-models`/`pcm-store` — the PEP and PCM are independently
//! deployable processes that only share a wire contract, so the wire
//! shapes below are defined locally rather than imported.

use std::sync::RwLock;
use std::time::Duration;

use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::config::Config;

const JWT_BEARER_ASSERTION_TYPE: &str = "urn:ietf:params:oauth:client-assertion-type:jwt-bearer";
const INTROSPECTION_SCOPE: &str = "introspection";
const ASSERTION_TTL_SECONDS: i64 = 60;

#[derive(Debug, Serialize)]
struct AssertionClaims {
    iss: String,
    sub: String,
    aud: String,
    jti: String,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Deserialize)]
struct SmartConfiguration {
    introspection_endpoint: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IntrospectionCnf {
    #[serde(rename = "x5t#S256")]
    pub x5t_s256: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IntrospectionResponse {
    Inactive {
        active: bool,
    },
    Active {
        active: bool,
        sub: String,
        scope: String,
        iss: String,
        aud: String,
        #[serde(default)]
        patient: Option<String>,
        #[serde(default, rename = "fhirContext")]
        fhir_context: Vec<Value>,
        cnf: IntrospectionCnf,
        exp: i64,
        iat: i64,
    },
}

impl IntrospectionResponse {
    pub fn is_active(&self) -> bool {
        matches!(self, IntrospectionResponse::Active { active, .. } if *active)
    }
}

struct CachedToken {
    access_token: String,
    expires_at: i64,
}

pub struct PcmClient {
    http: reqwest::Client,
    config: Config,
    signing_key: EncodingKey,
    cached_token: RwLock<Option<CachedToken>>,
    cached_introspection_endpoint: RwLock<Option<String>>,
}

impl PcmClient {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let identity_pem = {
            let mut bytes = std::fs::read(&config.pcm.client_cert_path)?;
            bytes.extend(std::fs::read(&config.pcm.client_key_path)?);
            bytes
        };
        let identity = reqwest::Identity::from_pem(&identity_pem)?;
        let ca_pem = std::fs::read(&config.pcm.trust_ca_path)?;
        let ca_cert = reqwest::Certificate::from_pem(&ca_pem)?;

        let http = reqwest::Client::builder()
            .identity(identity)
            .add_root_certificate(ca_cert)
            .timeout(Duration::from_secs(5))
            .build()?;

        let key_pem = std::fs::read(&config.pcm.client_key_path)?;
        let signing_key = EncodingKey::from_rsa_pem(&key_pem)?;

        Ok(Self {
            http,
            config,
            signing_key,
            cached_token: RwLock::new(None),
            cached_introspection_endpoint: RwLock::new(None),
        })
    }

    fn build_assertion(&self, now: i64) -> anyhow::Result<String> {
        // The assertion's `aud` must equal PCM's token endpoint (what
        // `verify_client_assertion` checks); this is distinct from the
        // `resource` form parameter below, which becomes the issued
        // token's `aud` instead.
        let claims = AssertionClaims {
            iss: self.config.pcm.client_id.clone(),
            sub: self.config.pcm.client_id.clone(),
            aud: format!("{}/token", self.config.pcm.base_url.trim_end_matches('/')),
            jti: Uuid::new_v4().to_string(),
            iat: now,
            exp: now + ASSERTION_TTL_SECONDS,
        };
        let header = Header::new(Algorithm::RS256);
        Ok(jsonwebtoken::encode(&header, &claims, &self.signing_key)?)
    }

    async fn fetch_token(&self) -> anyhow::Result<CachedToken> {
        let now = current_timestamp();
        let assertion = self.build_assertion(now)?;
        let token_url = format!("{}/token", self.config.pcm.base_url.trim_end_matches('/'));

        let response = self
            .http
            .post(&token_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_assertion_type", JWT_BEARER_ASSERTION_TYPE),
                ("client_assertion", assertion.as_str()),
                ("resource", self.config.pcm.base_url.trim_end_matches('/')),
                ("scope", INTROSPECTION_SCOPE),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("PCM /token returned {}", response.status());
        }

        let body: TokenResponse = response.json().await?;
        Ok(CachedToken {
            access_token: body.access_token,
            expires_at: now + body.expires_in,
        })
    }

    /// Obtains (and caches) this PEP's own PCM access token (§4.3 step 2).
    async fn access_token(&self, force_refresh: bool) -> anyhow::Result<String> {
        if !force_refresh {
            if let Some(cached) = self.cached_token.read().unwrap().as_ref() {
                if cached.expires_at > current_timestamp() + 1 {
                    return Ok(cached.access_token.clone());
                }
            }
        }

        let fresh = self.fetch_token().await?;
        let access_token = fresh.access_token.clone();
        *self.cached_token.write().unwrap() = Some(fresh);
        Ok(access_token)
    }

    /// Discovers (and caches) PCM's introspection endpoint, falling back
    /// to the configured default on discovery failure (§4.3 step 3).
    async fn introspection_endpoint(&self) -> String {
        if let Some(endpoint) = self.cached_introspection_endpoint.read().unwrap().as_ref() {
            return endpoint.clone();
        }

        let discovery_url = format!(
            "{}/r4/.well-known/smart-configuration",
            self.config.pcm.base_url.trim_end_matches('/')
        );

        let discovered = async {
            let response = self.http.get(&discovery_url).send().await.ok()?;
            if !response.status().is_success() {
                return None;
            }
            response
                .json::<SmartConfiguration>()
                .await
                .ok()
                .map(|c| c.introspection_endpoint)
        }
        .await;

        let endpoint = discovered.unwrap_or_else(|| {
            tracing::warn!("PCM SMART discovery failed; falling back to configured introspection endpoint");
            self.config.pcm.introspection_endpoint_fallback.clone()
        });

        *self.cached_introspection_endpoint.write().unwrap() = Some(endpoint.clone());
        endpoint
    }

    /// Calls PCM introspection for `token`, retrying once with a freshly
    /// fetched access token on `401`/`403` (§4.3 step 2).
    pub async fn introspect(&self, token: &str) -> anyhow::Result<IntrospectionResponse> {
        let endpoint = self.introspection_endpoint().await;

        for attempt in 0..2 {
            let access_token = self.access_token(attempt > 0).await?;
            let response = self
                .http
                .post(&endpoint)
                .bearer_auth(&access_token)
                .form(&[("token", token)])
                .send()
                .await?;

            match response.status() {
                status if status.is_success() => {
                    return Ok(response.json::<IntrospectionResponse>().await?);
                }
                status if status == 401 || status == 403 => {
                    tracing::warn!(%status, attempt, "PCM rejected our own access token; retrying once");
                    continue;
                }
                status => anyhow::bail!("PCM /introspect returned {status}"),
            }
        }

        anyhow::bail!("PCM /introspect kept rejecting this PEP's access token after retry")
    }
}

fn current_timestamp() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is before the Unix epoch")
        .as_secs() as i64
}
