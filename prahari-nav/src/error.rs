//! Error types for PrahariNav

use thiserror::Error;

/// PrahariNav error type
#[derive(Error, Debug)]
pub enum PrahariError {
    #[error("Link error: {0}")]
    Link(#[from] setu_io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<toml::de::Error> for PrahariError {
    fn from(e: toml::de::Error) -> Self {
        PrahariError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PrahariError>;
