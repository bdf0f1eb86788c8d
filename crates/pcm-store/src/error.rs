//! Error type for the in-memory stores.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{resource_type}/{id} not found")]
    NotFound { resource_type: &'static str, id: String },

    #[error("{resource_type}/{id} already exists")]
    AlreadyExists { resource_type: &'static str, id: String },

    #[error("invalid seed data: {0}")]
    InvalidSeed(String),
}

pub type Result<T> = std::result::Result<T, Error>;
