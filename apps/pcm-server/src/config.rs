//! Layered configuration: built-in defaults, then an optional file, then
//! `PCM_*`-prefixed environment variables, validated once at startup
//! before anything else runs (§10.1).

use std::net::SocketAddr;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct TlsConfig {
    /// PEM chain the listener presents to peers.
    pub server_cert_path: String,
    /// PEM private key matching `server_cert_path`.
    pub server_key_path: String,
    /// PEM bundle of CA certificates trusted to sign client certificates.
    pub client_ca_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    /// The canonical base URL peers use to reach this server's `/token`
    /// endpoint; both an http and https variant of this host are accepted
    /// as the client assertion's `aud` (§4.1 step 6), to tolerate
    /// TLS-terminating proxies in front of the listener.
    pub public_base_url: String,
    pub tls: TlsConfig,
}

impl ServerConfig {
    pub fn token_endpoint(&self) -> String {
        format!("{}/token", self.public_base_url.trim_end_matches('/'))
    }

    /// The two `aud` values a client assertion is allowed to target.
    pub fn accepted_assertion_audiences(&self) -> Vec<String> {
        let endpoint = self.token_endpoint();
        let mut audiences = vec![endpoint.clone()];
        if let Some(https_stripped) = endpoint.strip_prefix("https://") {
            audiences.push(format!("http://{https_stripped}"));
        } else if let Some(http_stripped) = endpoint.strip_prefix("http://") {
            audiences.push(format!("https://{http_stripped}"));
        }
        audiences
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedConfig {
    /// Overrides the embedded default seed fixture when set.
    pub path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    /// The only `client_id` permitted to call the `$approve`/`$reject`
    /// Consent transition routes (§10.4).
    pub client_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenConfig {
    #[serde(default = "default_token_ttl_seconds")]
    pub ttl_seconds: i64,
}

fn default_token_ttl_seconds() -> i64 {
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
    #[serde(default)]
    pub seed: SeedConfig,
    pub admin: AdminConfig,
    #[serde(default)]
    pub token: TokenConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self { path: None }
    }
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_token_ttl_seconds(),
        }
    }
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
    /// Loads defaults, an optional `PCM_CONFIG_FILE`-pointed file, then
    /// `PCM_*` environment overrides.
    pub fn load() -> anyhow::Result<Self> {
        let _ = dotenvy::dotenv();

        let mut builder = config::Config::builder()
            .set_default("server.listen_addr", "0.0.0.0:8443")?
            .set_default("server.public_base_url", "https://localhost:8443")?
            .set_default("server.tls.server_cert_path", "certs/server.pem")?
            .set_default("server.tls.server_key_path", "certs/server-key.pem")?
            .set_default("server.tls.client_ca_path", "certs/ca.pem")?
            .set_default("admin.client_id", "client-org-pcm-admin")?;

        if let Ok(path) = std::env::var("PCM_CONFIG_FILE") {
            builder = builder.add_source(config::File::with_name(&path).required(false));
        } else {
            builder = builder.add_source(config::File::with_name("pcm-server").required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("PCM")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.admin.client_id.trim().is_empty() {
            anyhow::bail!("admin.client_id must not be empty");
        }
        if self.token.ttl_seconds <= 0 {
            anyhow::bail!("token.ttl_seconds must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepted_audiences_cover_both_schemes() {
        let server = ServerConfig {
            listen_addr: "0.0.0.0:8443".parse().unwrap(),
            public_base_url: "https://pcm.example:8443".to_string(),
            tls: TlsConfig {
                server_cert_path: "a".into(),
                server_key_path: "b".into(),
                client_ca_path: "c".into(),
            },
        };
        let audiences = server.accepted_assertion_audiences();
        assert!(audiences.contains(&"https://pcm.example:8443/token".to_string()));
        assert!(audiences.contains(&"http://pcm.example:8443/token".to_string()));
    }
}
