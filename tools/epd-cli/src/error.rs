//! Display client errors

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    /// The display answered with a non-2xx status
    #[error("{endpoint} failed with HTTP {status}")]
    Transport { endpoint: String, status: u16 },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("response is missing the '{0}' header")]
    MissingHeader(&'static str),

    #[error("header '{name}' has invalid value '{value}'")]
    InvalidHeader { name: &'static str, value: String },

    #[error("failed to start async runtime: {0}")]
    Runtime(#[from] std::io::Error),
}
