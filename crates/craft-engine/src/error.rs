use std::fmt;

use craft_state::StateError;

/// Errors raised by listeners during dispatch. Any of these aborts the whole
/// transaction: the engine performs no partial commit and no retry, and the
/// external runtime discards every staged write of the failed transaction.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The payload violates a business rule (wrong status, wrong actor on a
    /// non-ownership rule, forbidden edit, malformed fields).
    #[error("validation error: {0}")]
    Validation(String),

    /// A referenced account or asset address holds no state.
    #[error("not found: {0}")]
    NotFound(String),

    /// The actor lacks authority for the action.
    #[error("permission denied: {0}")]
    Permission(String),

    /// Malformed stored or incoming bytes.
    #[error("decode error: {0}")]
    Decode(String),

    /// The state provider itself failed.
    #[error(transparent)]
    State(StateError),
}

impl EngineError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn permission(message: impl Into<String>) -> Self {
        Self::Permission(message.into())
    }
}

impl From<StateError> for EngineError {
    fn from(err: StateError) -> Self {
        match err {
            StateError::Decode(msg) => Self::Decode(msg),
            other => Self::State(other),
        }
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        // Compare by display representation for test convenience.
        fmt::format(format_args!("{self}")) == fmt::format(format_args!("{other}"))
    }
}

impl Eq for EngineError {}
