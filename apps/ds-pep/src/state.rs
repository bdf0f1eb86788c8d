//! Shared application state for the PEP process.

use std::sync::Arc;

use crate::config::Config;
use crate::pcm_client::PcmClient;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub pcm: Arc<PcmClient>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let pcm = PcmClient::new(config.clone())?;
        Ok(Self {
            config: Arc::new(config),
            pcm: Arc::new(pcm),
        })
    }
}
