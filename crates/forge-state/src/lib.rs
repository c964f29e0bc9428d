//! Forge-State: build record store contract
//!
//! This crate defines the persistence boundary of the Forge data layer.
//! It owns the record schema (builds, builders, buildrequests, workers,
//! build properties) and the async traits the data layer calls through.
//!
//! ## Key Components
//!
//! - `BuildStore`: lookup, filtered query, and mutation of build rows
//! - `RelationLookup`: read-only resolution of builder/buildrequest/worker refs
//! - `MemoryBuildStore`: in-memory fake satisfying both traits, used by tests

mod error;
pub mod fakes;
mod schema;
mod store;

pub use error::{StoreError, StoreResult};
pub use schema::{
    AddBuild, BuildQuery, BuildRecord, BuildRequestRecord, BuilderRecord, PropertyRow,
    WorkerRecord,
};
pub use store::{BuildStore, RelationLookup};
