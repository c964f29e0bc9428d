//! Error types for forge-state

use thiserror::Error;

/// Errors that can occur in the build store layer
#[derive(Error, Debug)]
pub enum StoreError {
    /// Mutation addressed to a build that does not exist
    #[error("Build not found: {buildid}")]
    BuildNotFound { buildid: i64 },

    /// A seeded row collides with an existing `(builderid, number)` pair
    #[error("Duplicate build number {number} for builder {builderid}")]
    DuplicateBuildNumber { builderid: i64, number: i64 },

    /// The build has already been finished; the row is frozen
    #[error("Build {buildid} is already complete")]
    BuildAlreadyComplete { buildid: i64 },

    /// Storage backend failure
    #[error("Storage backend failure: {0}")]
    Backend(String),
}

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;
