//! Error types for the data access layer

use forge_state::StoreError;
use thiserror::Error;

use crate::events::PublishError;

/// Errors surfaced by the data access layer.
///
/// Absence is not an error: singular reads return `Ok(None)` and
/// collection reads return `Ok(vec![])` when nothing matches.
#[derive(Error, Debug)]
pub enum DataError {
    /// A path does not name any known resource shape
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// A control action name with no registered handler
    #[error("Unsupported control action: {0}")]
    UnknownAction(String),

    /// A control payload field of the wrong shape
    #[error("Invalid control payload: {0}")]
    InvalidPayload(String),

    /// A mutating or control call addressed to a build that does not exist
    #[error("Build not found: {0}")]
    NotFound(String),

    /// A lifecycle rule was violated (e.g. finishing a finished build)
    #[error("Lifecycle violation: {0}")]
    StateViolation(String),

    /// Store failure, propagated unchanged
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Event bus failure, propagated unchanged
    #[error(transparent)]
    Publish(#[from] PublishError),
}

/// Result type for data layer operations
pub type Result<T> = std::result::Result<T, DataError>;
