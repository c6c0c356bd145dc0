use thiserror::Error;

/// Errors produced at the state boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("decode error: {0}")]
    Decode(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("store error: {0}")]
    Store(String),
}
