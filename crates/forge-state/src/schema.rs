//! Record schema for the build store
//!
//! These are the raw row shapes the store hands back. The data layer
//! derives its emitted representation from them; nothing here is
//! transport-facing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One build row.
///
/// Identity: `buildid` is globally unique; `(builderid, number)` is unique
/// and `number` increases monotonically per builder. All foreign references
/// are set at creation and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildRecord {
    pub buildid: i64,
    pub number: i64,
    pub builderid: i64,
    pub buildrequestid: i64,
    pub workerid: i64,
    pub masterid: i64,
    pub started_at: DateTime<Utc>,
    /// Set exactly once, by `finish_build`. Null while the build runs.
    pub complete_at: Option<DateTime<Utc>>,
    /// Result code; null iff `complete_at` is null.
    pub results: Option<i64>,
    /// Human-readable status. Mutable while incomplete, frozen afterwards.
    pub state_string: String,
}

impl BuildRecord {
    /// Derived completion flag: true iff `complete_at` is set.
    pub fn complete(&self) -> bool {
        self.complete_at.is_some()
    }
}

/// A named build property with its source annotation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyRow {
    pub value: serde_json::Value,
    /// Where the property came from (e.g. "Force Build Form")
    pub source: String,
}

/// A builder row, referenced by id or unique name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuilderRecord {
    pub builderid: i64,
    pub name: String,
}

/// A buildrequest row; belongs to exactly one buildset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRequestRecord {
    pub buildrequestid: i64,
    pub buildsetid: i64,
    pub builderid: i64,
}

/// A worker row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerRecord {
    pub workerid: i64,
    pub name: String,
}

/// Arguments for creating a build row.
///
/// The store allocates `buildid` and the per-builder `number`; the caller
/// supplies everything else, including the master identity stamping the row.
#[derive(Debug, Clone)]
pub struct AddBuild {
    pub builderid: i64,
    pub buildrequestid: i64,
    pub workerid: i64,
    pub masterid: i64,
    pub state_string: String,
}

/// The filter set a store query can express natively.
///
/// Every field is conjunctive; `None` means unconstrained. Anything the
/// caller cannot express here is applied in memory on top of the result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildQuery {
    pub builderid: Option<i64>,
    pub buildrequestid: Option<i64>,
    pub workerid: Option<i64>,
    pub complete: Option<bool>,
}

impl BuildQuery {
    /// Unconstrained query matching every build.
    pub fn all() -> Self {
        Self::default()
    }

    /// True if the given record satisfies every set constraint.
    pub fn matches(&self, build: &BuildRecord) -> bool {
        self.builderid.map_or(true, |id| build.builderid == id)
            && self.buildrequestid.map_or(true, |id| build.buildrequestid == id)
            && self.workerid.map_or(true, |id| build.workerid == id)
            && self.complete.map_or(true, |c| build.complete() == c)
    }
}
