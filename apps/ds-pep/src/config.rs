//! Layered configuration for the PEP, following the same
//! defaults-then-file-then-env pattern as the PCM server (§10.1),
//! `PEP_*`-prefixed here.

use std::net::SocketAddr;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct PcmConfig {
    /// Base URL of the PCM authorization server (no trailing slash).
    pub base_url: String,
    /// Fallback introspection endpoint used when SMART discovery fails.
    pub introspection_endpoint_fallback: String,
    /// This PEP's own registered `client_id` for the `introspection` scope.
    pub client_id: String,
    /// PEM private key used to sign this PEP's own client assertions
    /// against `base_url`'s `/token`.
    pub client_key_path: String,
    /// PEM certificate matching `client_key_path`, presented for mTLS
    /// when calling PCM.
    pub client_cert_path: String,
    /// PEM bundle of CA certificates trusted to sign PCM's server
    /// certificate.
    pub trust_ca_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocalTokenConfig {
    /// Shared HMAC-SHA256 secret used to mint the local JWT trusted by
    /// the DS Resource Server.
    pub hmac_secret: String,
    #[serde(default = "default_local_ttl_seconds")]
    pub ttl_seconds: i64,
}

fn default_local_ttl_seconds() -> i64 {
    30
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_environment")]
    pub deployment_environment: String,
    #[serde(default)]
    pub json: bool,
}

fn default_environment() -> String {
    "development".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub pcm: PcmConfig,
    pub local_token: LocalTokenConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            deployment_environment: default_environment(),
            json: false,
        }
    }
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let _ = dotenvy::dotenv();

        let mut builder = config::Config::builder()
            .set_default("server.listen_addr", "0.0.0.0:8081")?
            .set_default("local_token.ttl_seconds", 30)?;

        if let Ok(path) = std::env::var("PEP_CONFIG_FILE") {
            builder = builder.add_source(config::File::with_name(&path).required(false));
        } else {
            builder = builder.add_source(config::File::with_name("ds-pep").required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("PEP")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.pcm.client_id.trim().is_empty() {
            anyhow::bail!("pcm.client_id must not be empty");
        }
        if self.pcm.base_url.trim().is_empty() {
            anyhow::bail!("pcm.base_url must not be empty");
        }
        if self.local_token.hmac_secret.trim().is_empty() {
            anyhow::bail!("local_token.hmac_secret must not be empty");
        }
        if self.local_token.ttl_seconds <= 0 {
            anyhow::bail!("local_token.ttl_seconds must be positive");
        }
        Ok(())
    }
}
