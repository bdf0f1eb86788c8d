//! Layered configuration for the DS Resource Server (§10.1), `DSRS_*`-prefixed.

use std::net::SocketAddr;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocalTokenConfig {
    /// Must match the PEP's `local_token.hmac_secret` (§4.4 trusts only
    /// the PEP-minted local JWT).
    pub hmac_secret: String,
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

        let mut builder =
            config::Config::builder().set_default("server.listen_addr", "0.0.0.0:8082")?;

        if let Ok(path) = std::env::var("DSRS_CONFIG_FILE") {
            builder = builder.add_source(config::File::with_name(&path).required(false));
        } else {
            builder = builder.add_source(config::File::with_name("ds-rs").required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("DSRS")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.local_token.hmac_secret.trim().is_empty() {
            anyhow::bail!("local_token.hmac_secret must not be empty");
        }
        Ok(())
    }
}
