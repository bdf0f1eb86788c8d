//! DS Resource Server: trusts only the PEP-minted local JWT and returns a
//! mock Bundle keyed by the mapped patient id (§4.4).

pub mod api;
pub mod config;
pub mod error;
pub mod jwt;
pub mod logging;
pub mod observation;
pub mod state;

pub use config::Config;
pub use error::{Error, Result};
pub use state::AppState;
