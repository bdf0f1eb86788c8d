//! mTLS listener setup and per-connection peer-certificate extraction.
//!
//! `ferrum` has no mTLS surface of its own; the client-certificate-verifier
//! plumbing here (`build_server_config`, `load_certificates`,
//! `load_private_key`, `load_root_store`) is grounded on the TLS setup in
//! `decision-gate-mcp::server::build_tls_config` (mutual-TLS MCP server).
//! That example never needed the peer certificate *inside* a handler (it
//! only enforces chain verification at the connection level); this system
//! needs the actual thumbprint for the holder-of-key advisory check in
//! §4.1 step 8, so `PeerCertAcceptor` additionally threads it through via
//! `tower_http::add_extension`, composed from the documented `axum-server`
//! `Accept` extension point rather than from any single example file.

use std::fs::File;
use std::future::Future;
use std::io::BufReader;
use std::pin::Pin;
use std::sync::Arc;

use axum_server::accept::Accept;
use axum_server::tls_rustls::RustlsAcceptor;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::server::WebPkiClientVerifier;
use rustls::RootCertStore;
use tokio::io::{AsyncRead, AsyncWrite};
use tower_http::add_extension::AddExtension;

use crate::config::TlsConfig;

/// The mTLS peer's leaf-certificate thumbprint, inserted into request
/// extensions by [`PeerCertAcceptor`]. `None` when no client certificate
/// was presented (can only happen if the verifier is misconfigured to
/// allow it; this server always requires one).
#[derive(Debug, Clone)]
pub struct PeerCertThumbprint(pub String);

pub fn build_server_config(tls: &TlsConfig) -> anyhow::Result<rustls::ServerConfig> {
    let certs = load_certificates(&tls.server_cert_path)?;
    let key = load_private_key(&tls.server_key_path)?;
    let roots = load_root_store(&tls.client_ca_path)?;
    let verifier = WebPkiClientVerifier::builder(Arc::new(roots))
        .build()
        .map_err(|e| anyhow::anyhow!("building client cert verifier: {e}"))?;

    let mut server_config = rustls::ServerConfig::builder()
        .with_client_cert_verifier(verifier)
        .with_single_cert(certs, key)
        .map_err(|e| anyhow::anyhow!("invalid server TLS config: {e}"))?;
    server_config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];
    Ok(server_config)
}

fn load_certificates(path: &str) -> anyhow::Result<Vec<CertificateDer<'static>>> {
    let file = File::open(path).map_err(|e| anyhow::anyhow!("opening {path}: {e}"))?;
    let mut reader = BufReader::new(file);
    let certs: Vec<_> = rustls_pemfile::certs(&mut reader)
        .collect::<Result<_, _>>()
        .map_err(|e| anyhow::anyhow!("reading certs from {path}: {e}"))?;
    if certs.is_empty() {
        anyhow::bail!("{path} contains no certificates");
    }
    Ok(certs)
}

fn load_private_key(path: &str) -> anyhow::Result<PrivateKeyDer<'static>> {
    let file = File::open(path).map_err(|e| anyhow::anyhow!("opening {path}: {e}"))?;
    let mut reader = BufReader::new(file);
    rustls_pemfile::private_key(&mut reader)
        .map_err(|e| anyhow::anyhow!("reading key from {path}: {e}"))?
        .ok_or_else(|| anyhow::anyhow!("{path} contains no private key"))
}

fn load_root_store(path: &str) -> anyhow::Result<RootCertStore> {
    let file = File::open(path).map_err(|e| anyhow::anyhow!("opening {path}: {e}"))?;
    let mut reader = BufReader::new(file);
    let certs: Vec<_> = rustls_pemfile::certs(&mut reader)
        .collect::<Result<_, _>>()
        .map_err(|e| anyhow::anyhow!("reading CA bundle from {path}: {e}"))?;
    if certs.is_empty() {
        anyhow::bail!("{path} contains no CA certificates");
    }
    let mut store = RootCertStore::empty();
    for cert in certs {
        store
            .add(cert)
            .map_err(|e| anyhow::anyhow!("invalid CA certificate in {path}: {e}"))?;
    }
    Ok(store)
}

/// Wraps [`RustlsAcceptor`] to insert an `Option<PeerCertThumbprint>`
/// extension into every request, computed from the verified client
/// certificate chain rustls already terminated the handshake with.
#[derive(Clone)]
pub struct PeerCertAcceptor {
    inner: RustlsAcceptor,
}

impl PeerCertAcceptor {
    pub fn new(server_config: rustls::ServerConfig) -> Self {
        let config = axum_server::tls_rustls::RustlsConfig::from_config(Arc::new(server_config));
        Self {
            inner: RustlsAcceptor::new(config),
        }
    }
}

impl<I, S> Accept<I, S> for PeerCertAcceptor
where
    I: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    S: Send + 'static,
{
    type Stream = tokio_rustls::server::TlsStream<I>;
    type Service = AddExtension<S, Option<PeerCertThumbprint>>;
    type Future = Pin<Box<dyn Future<Output = std::io::Result<(Self::Stream, Self::Service)>> + Send>>;

    fn accept(&self, stream: I, service: S) -> Self::Future {
        let inner = self.inner.clone();
        Box::pin(async move {
            let (stream, service) = inner.accept(stream, service).await?;
            let thumbprint = stream
                .get_ref()
                .1
                .peer_certificates()
                .and_then(|certs| certs.first())
                .map(|der| PeerCertThumbprint(pcm_models::thumbprint::thumbprint_der(der.as_ref())));
            Ok((stream, AddExtension::new(service, thumbprint)))
        })
    }
}
