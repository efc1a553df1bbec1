//! Error types for EQLAB.
//!
//! All library crates surface failures through `EqlabError`. Two rules apply
//! across the workspace:
//! - input validation fails at the boundary with an actionable message that
//!   names the offending field or id
//! - budget exhaustion (search timeouts, candidate cutoffs, inconclusive
//!   probes) is recorded as status data inside artifacts and is never an error

use thiserror::Error;

/// Workspace-wide result alias.
pub type EqlabResult<T> = Result<T, EqlabError>;

#[derive(Debug, Error)]
pub enum EqlabError {
    /// A caller-supplied value failed validation.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Malformed textual input (term strings, axiom lines).
    #[error("parse error: {0}")]
    Parse(String),

    /// JSON encode/decode failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// An internal consistency guarantee was broken.
    #[error("invariant violation: {0}")]
    Invariant(String),

    /// A referenced entity (run id, axiom id) does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A persistence operation failed.
    #[error("store error: {0}")]
    Store(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl EqlabError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::Invariant(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }
}

impl From<serde_json::Error> for EqlabError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
