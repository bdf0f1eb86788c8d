//! PCM Authorization Server + Resource Server — entry point.

use anyhow::Context;
use pcm_server::tls::{build_server_config, PeerCertAcceptor};
use pcm_server::{api, config::Config, logging, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;
    logging::init_logging(&config.logging).context("failed to initialize logging")?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = config.logging.deployment_environment,
        "starting PCM server"
    );

    let listen_addr = config.server.listen_addr;
    let tls_config = build_server_config(&config.server.tls).context("failed to build TLS config")?;

    let state = AppState::new(config)
        .await
        .context("failed to initialize application state")?;
    let app = api::build_router(state);

    tracing::info!(%listen_addr, "PCM server listening");

    let handle = axum_server::Handle::new();
    tokio::spawn(shutdown_signal(handle.clone()));

    axum_server::bind(listen_addr)
        .acceptor(PeerCertAcceptor::new(tls_config))
        .handle(handle)
        .serve(app.into_make_service())
        .await
        .context("server terminated unexpectedly")?;

    tracing::info!("PCM server shutdown complete");

    Ok(())
}

/// Waits for SIGTERM or SIGINT, then tells `axum_server` to stop accepting
/// new connections and let in-flight requests drain.
#[cfg(unix)]
async fn shutdown_signal(handle: axum_server::Handle) {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm =
        signal(SignalKind::terminate()).expect("failed to install SIGTERM signal handler");
    let sigint = tokio::signal::ctrl_c();

    tokio::select! {
        _ = sigint => {
            tracing::info!("SIGINT received, starting graceful shutdown...");
        }
        _ = sigterm.recv() => {
            tracing::info!("SIGTERM received, starting graceful shutdown...");
        }
    }

    handle.graceful_shutdown(Some(std::time::Duration::from_secs(30)));
}

#[cfg(not(unix))]
async fn shutdown_signal(handle: axum_server::Handle) {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install CTRL+C signal handler");
    tracing::info!("SIGINT received, starting graceful shutdown...");
    handle.graceful_shutdown(Some(std::time::Duration::from_secs(30)));
}
