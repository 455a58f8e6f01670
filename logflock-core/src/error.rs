//! Error types for the logflock core library.

use thiserror::Error;

use crate::types::AgentId;

/// Top-level error type for all logflock operations.
#[derive(Error, Debug)]
pub enum FlockError {
    /// `spawn` was called with an id that already has a live agent.
    #[error("Agent already registered: {0}")]
    DuplicateAgent(AgentId),

    /// A lookup, highlight, or removal referenced an id with no live agent.
    ///
    /// Hosts treat this as a no-op: agents can disappear between an input
    /// event being queued and being processed.
    #[error("Agent not found: {0}")]
    UnknownAgent(AgentId),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization or deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for FlockError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, FlockError>;
