//! PCM Authorization Server and Resource Server.
//!
//! One process, one mTLS listener, carrying both the token/introspection
//! routes (§4.1) and the FHIR-style `/r4` CRUD/search surface (§4.2) over a
//! shared in-memory token store and resource graph (§5).

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod logging;
pub mod request_context;
pub mod state;
pub mod tls;

pub use config::Config;
pub use error::{Error, Result};
pub use state::AppState;
