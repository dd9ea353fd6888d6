use thiserror::Error;

use crate::types::Timestamp;

/// Top-level error type for AgentDeck.
///
/// Subsystem crates define their own error types; anything that touches
/// configuration, files or the domain model funnels through this one.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AgentDeckError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Message out of order: {incoming:?} is older than {last:?}")]
    OutOfOrder { last: Timestamp, incoming: Timestamp },
}

impl From<toml::de::Error> for AgentDeckError {
    fn from(err: toml::de::Error) -> Self {
        AgentDeckError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for AgentDeckError {
    fn from(err: toml::ser::Error) -> Self {
        AgentDeckError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for AgentDeckError {
    fn from(err: serde_json::Error) -> Self {
        AgentDeckError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for AgentDeck operations.
pub type Result<T> = std::result::Result<T, AgentDeckError>;
