//! Logging initialization for the PCM server binary (§10.2).
//!
//! `ferrum`'s server wires `tracing`/`tracing-subscriber` through an
//! OpenTelemetry exporter; this binary keeps the `tracing`/`tracing-subscriber`
//! half of that stack and drops the OTel exporter, since there is no
//! collector in scope for this core (see DESIGN.md).

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    if config.json {
        registry.with(fmt::layer().json()).try_init()?;
    } else {
        registry.with(fmt::layer()).try_init()?;
    }

    Ok(())
}
