use thiserror::Error;

use crate::common::error::ScheddError::GenericError;

#[derive(Debug, Error)]
pub enum ScheddError {
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error("Deserialization error: {0}")]
    DeserializationError(String),
    #[error("Negotiation error: {0}")]
    NegotiationError(#[from] negotiation::Error),
    #[error("Error: {0}")]
    GenericError(String),
}

impl From<toml::de::Error> for ScheddError {
    fn from(error: toml::de::Error) -> Self {
        Self::DeserializationError(error.to_string())
    }
}

impl From<anyhow::Error> for ScheddError {
    fn from(error: anyhow::Error) -> Self {
        Self::GenericError(error.to_string())
    }
}

impl From<String> for ScheddError {
    fn from(e: String) -> Self {
        GenericError(e)
    }
}

pub fn error<T>(message: String) -> crate::Result<T> {
    Err(GenericError(message))
}
