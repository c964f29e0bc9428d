//! Storage trait definitions for the build data layer
//!
//! These traits define the store gateway the data layer calls through:
//! - `BuildStore`: lookup, filtered query, and mutation of build rows
//! - `RelationLookup`: read-only resolution of related records
//!
//! All traits are async and backend-agnostic. In-memory fakes are provided
//! for testing via the `fakes` module.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::schema::{
    AddBuild, BuildQuery, BuildRecord, BuildRequestRecord, BuilderRecord, PropertyRow,
    WorkerRecord,
};

// ---------------------------------------------------------------------------
// BuildStore — build row persistence
// ---------------------------------------------------------------------------

/// Build row store.
///
/// Guarantees:
/// - `add_build` allocates a globally unique `buildid` and a per-builder
///   `number` that is strictly greater than any existing number for that
///   builder.
/// - `get_builds` returns rows in `buildid` order.
/// - `finish_build` succeeds at most once per build; the row is frozen
///   afterwards (`BuildAlreadyComplete` on any further mutation).
#[async_trait]
pub trait BuildStore: Send + Sync {
    /// Look up a build by its global id. `None` if absent.
    async fn get_build(&self, buildid: i64) -> StoreResult<Option<BuildRecord>>;

    /// Look up a build by `(builderid, number)`. `None` if absent.
    async fn get_build_by_number(
        &self,
        builderid: i64,
        number: i64,
    ) -> StoreResult<Option<BuildRecord>>;

    /// Query builds matching every constraint in `query`, in id order.
    async fn get_builds(&self, query: &BuildQuery) -> StoreResult<Vec<BuildRecord>>;

    /// Create a build row, returning `(buildid, number)`.
    async fn add_build(&self, build: AddBuild) -> StoreResult<(i64, i64)>;

    /// Overwrite the mutable status text of an incomplete build.
    async fn set_build_state_string(&self, buildid: i64, state_string: &str) -> StoreResult<()>;

    /// Atomically mark a build complete: sets `complete_at` to now and
    /// `results` to the given code. At most one successful call per build.
    async fn finish_build(&self, buildid: i64, results: i64) -> StoreResult<()>;

    /// All properties of a build, keyed by name. Empty map if none.
    async fn get_build_properties(
        &self,
        buildid: i64,
    ) -> StoreResult<HashMap<String, PropertyRow>>;

    /// Set (or overwrite) one named property of a build.
    async fn set_build_property(
        &self,
        buildid: i64,
        name: &str,
        value: serde_json::Value,
        source: &str,
    ) -> StoreResult<()>;
}

// ---------------------------------------------------------------------------
// RelationLookup — related record resolution
// ---------------------------------------------------------------------------

/// Read-only resolution of the records a build references.
///
/// Lookups never error on absence; an unknown id or name is `None`.
#[async_trait]
pub trait RelationLookup: Send + Sync {
    /// Look up a builder by id.
    async fn get_builder(&self, builderid: i64) -> StoreResult<Option<BuilderRecord>>;

    /// Look up a builder by its unique name.
    async fn find_builder_by_name(&self, name: &str) -> StoreResult<Option<BuilderRecord>>;

    /// Look up a buildrequest by id.
    async fn get_buildrequest(
        &self,
        buildrequestid: i64,
    ) -> StoreResult<Option<BuildRequestRecord>>;

    /// Look up a worker by id.
    async fn get_worker(&self, workerid: i64) -> StoreResult<Option<WorkerRecord>>;
}
