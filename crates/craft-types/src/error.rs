use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("unknown event type: {0}")]
    UnknownEventType(String),

    #[error("unknown account type: {0}")]
    UnknownAccountType(String),

    #[error("unknown asset type: {0}")]
    UnknownAssetType(String),

    #[error("unknown status value: {0}")]
    UnknownStatus(String),
}
