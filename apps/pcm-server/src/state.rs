//! Shared application state for the AS+RS process (§5: "RS and AS share
//! the same process... and therefore share the token store and resource
//! store in memory").

use std::collections::HashMap;
use std::sync::Arc;

use pcm_store::{BootstrapSeed, ClientRecord, FhirStore, TokenStore};

use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub fhir_store: Arc<FhirStore>,
    pub token_store: Arc<TokenStore>,
    pub clients: Arc<HashMap<String, ClientRecord>>,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let seed = match &config.seed.path {
            Some(path) => BootstrapSeed::load_from_path(path)?,
            None => BootstrapSeed::load_default()?,
        };

        let fhir_store = FhirStore::new();
        seed.apply(&fhir_store).await?;

        let clients = seed
            .clients
            .iter()
            .cloned()
            .map(|c| (c.client_id.clone(), c))
            .collect::<HashMap<_, _>>();

        Ok(Self {
            config: Arc::new(config),
            fhir_store: Arc::new(fhir_store),
            token_store: Arc::new(TokenStore::new()),
            clients: Arc::new(clients),
        })
    }

    pub fn client(&self, client_id: &str) -> Option<&ClientRecord> {
        self.clients.get(client_id)
    }
}
