//! Error types for the resource/token models.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("invalid reference: {0}")]
    InvalidReference(String),

    #[error("invalid certificate: {0}")]
    InvalidCertificate(String),
}

pub type Result<T> = std::result::Result<T, Error>;
