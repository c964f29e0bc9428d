//! Forge-Data: the build resource layer
//!
//! Exposes build records through addressable, filterable resources and
//! propagates lifecycle changes as multi-topic events:
//! - `paths`: hierarchical addresses normalized to canonical lookups
//! - `resultspec`: declarative filters and property projection, executed
//!   store-side when expressible and in memory otherwise
//! - `builds`: the resource type owning reads, the update API, and the
//!   control-action dispatcher
//! - `events`: deterministic fan-out of one logical event to every topic
//!   derived from a build's relationships
//!
//! The persistent store and event bus are reached only through the traits
//! in `forge_state` and `events`; fakes for both live in the `fakes`
//! modules.

pub mod builds;
mod error;
pub mod events;
pub mod fakes;
pub mod paths;
pub mod resultspec;

pub use builds::{BuildView, Builds, ControlOutcome, RebuildBuildRequest};
pub use error::{DataError, Result};
pub use events::{build_event_topics, fan_out_build_event, EventPublisher, PublishError};
pub use paths::{BuildAddress, BuilderRef, BuildsAddress};
pub use resultspec::{FieldValue, Filter, FilterOp, ResultSpec};
