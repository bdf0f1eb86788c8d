//! The opaque-token map the AS mints into and introspects out of.
//!
//! Expiry is checked lazily on lookup, matching §4.1 "State": there is no
//! background sweeper, and an expired entry is removed the moment anyone
//! tries to read it.

use std::collections::HashMap;

use pcm_models::TokenRecord;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct TokenStore {
    tokens: RwLock<HashMap<String, TokenRecord>>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, record: TokenRecord) {
        self.tokens.write().await.insert(record.token.clone(), record);
    }

    /// Returns the record if present and unexpired as of `now`, deleting it
    /// if it has expired. Audience binding (T2) is the caller's job — this
    /// layer only knows about expiry.
    pub async fn get_active(&self, token: &str, now: i64) -> Option<TokenRecord> {
        let mut tokens = self.tokens.write().await;
        match tokens.get(token) {
            Some(record) if record.is_expired(now) => {
                tokens.remove(token);
                None
            }
            Some(record) => Some(record.clone()),
            None => None,
        }
    }
}
