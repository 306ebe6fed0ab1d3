use thiserror::Error;

#[allow(clippy::enum_variant_names)]
#[derive(Debug, Error)]
pub enum NegotiationError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Protocol error: {0}")]
    ProtocolError(String),
    #[error("Timeout: {0}")]
    Timeout(String),
    #[error("Connection closed by the remote side")]
    ConnectionClosed,
    #[error("Error: {0}")]
    GenericError(String),
}

impl From<bincode::Error> for NegotiationError {
    fn from(e: bincode::Error) -> Self {
        Self::SerializationError(e.to_string())
    }
}
impl From<String> for NegotiationError {
    fn from(e: String) -> Self {
        Self::GenericError(e)
    }
}
impl From<&str> for NegotiationError {
    fn from(e: &str) -> Self {
        Self::GenericError(e.to_string())
    }
}
