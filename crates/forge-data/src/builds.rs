//! The Build resource type
//!
//! Single point of read and mutation for build records. Reads resolve a
//! hierarchical address through the store gateway and shape the result
//! with a `ResultSpec`; mutations drive the build lifecycle
//! (created -> running -> complete) and hand finished representations to
//! the event fan-out. Control actions (`stop`, `rebuild`) are dispatched
//! here by name.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use forge_state::{
    AddBuild, BuildQuery, BuildRecord, BuildRequestRecord, BuildStore, BuilderRecord,
    RelationLookup, StoreError,
};

use crate::error::{DataError, Result};
use crate::events::{fan_out_build_event, EventPublisher};
use crate::paths::{BuildAddress, BuilderRef, BuildsAddress};
use crate::resultspec::{FieldValue, ResultSpec};

/// The canonical emitted representation of a build.
///
/// This is what reads return and what event payloads carry: timestamps as
/// epoch seconds, `complete` derived, and properties as a name-to-value
/// mapping with source annotations stripped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildView {
    pub buildid: i64,
    pub number: i64,
    pub builderid: i64,
    pub buildrequestid: i64,
    pub workerid: i64,
    pub masterid: i64,
    pub complete: bool,
    pub complete_at: Option<i64>,
    pub started_at: i64,
    pub results: Option<i64>,
    pub state_string: String,
    pub properties: BTreeMap<String, serde_json::Value>,
}

impl BuildView {
    /// A field's current value, as seen by the filter engine.
    ///
    /// Unknown field names read as `Null`, which makes a filter on them
    /// match only explicit `Null` value sets.
    pub fn field(&self, name: &str) -> FieldValue {
        match name {
            "buildid" => FieldValue::Int(self.buildid),
            "number" => FieldValue::Int(self.number),
            "builderid" => FieldValue::Int(self.builderid),
            "buildrequestid" => FieldValue::Int(self.buildrequestid),
            "workerid" => FieldValue::Int(self.workerid),
            "masterid" => FieldValue::Int(self.masterid),
            "complete" => FieldValue::Bool(self.complete),
            "complete_at" => self.complete_at.map_or(FieldValue::Null, FieldValue::Int),
            "started_at" => FieldValue::Int(self.started_at),
            "results" => self.results.map_or(FieldValue::Null, FieldValue::Int),
            "state_string" => FieldValue::Str(self.state_string.clone()),
            _ => FieldValue::Null,
        }
    }
}

/// Outcome of a control action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlOutcome {
    /// The action was accepted; any effect happens elsewhere
    Acknowledged,
    /// `rebuild` delegated and returned new identifiers
    Rebuilt {
        buildsetid: i64,
        buildrequestids: Vec<i64>,
    },
}

/// External "rebuild this buildrequest" operation the `rebuild` control
/// action delegates to. Returns the new buildset id and the ids of the
/// buildrequests it created.
#[async_trait]
pub trait RebuildBuildRequest: Send + Sync {
    async fn rebuild_buildrequest(
        &self,
        buildrequest: &BuildRequestRecord,
    ) -> Result<(i64, Vec<i64>)>;
}

/// The build resource type.
///
/// All collaborators are injected at construction; the master identity is
/// passed explicitly into every call that stamps it.
pub struct Builds {
    store: Arc<dyn BuildStore>,
    relations: Arc<dyn RelationLookup>,
    publisher: Arc<dyn EventPublisher>,
    rebuilder: Arc<dyn RebuildBuildRequest>,
}

impl Builds {
    pub fn new(
        store: Arc<dyn BuildStore>,
        relations: Arc<dyn RelationLookup>,
        publisher: Arc<dyn EventPublisher>,
        rebuilder: Arc<dyn RebuildBuildRequest>,
    ) -> Self {
        Builds {
            store,
            relations,
            publisher,
            rebuilder,
        }
    }

    // -----------------------------------------------------------------------
    // Read API
    // -----------------------------------------------------------------------

    /// Resolve a singular address. Absence is `Ok(None)`, never an error;
    /// an unknown builder name behaves exactly like an unknown id.
    pub async fn get(
        &self,
        address: &BuildAddress,
        spec: &ResultSpec,
    ) -> Result<Option<BuildView>> {
        let record = match address {
            BuildAddress::Build { buildid } => self.store.get_build(*buildid).await?,
            BuildAddress::BuilderBuild { builder, number } => {
                match self.resolve_builder(builder).await? {
                    Some(b) => self.store.get_build_by_number(b.builderid, *number).await?,
                    None => None,
                }
            }
        };
        match record {
            Some(record) => Ok(Some(self.view_of(&record, spec).await?)),
            None => Ok(None),
        }
    }

    /// Resolve a collection address into an ordered, filtered sequence.
    /// Unknown referents yield an empty collection.
    pub async fn get_many(
        &self,
        address: &BuildsAddress,
        spec: &ResultSpec,
    ) -> Result<Vec<BuildView>> {
        let mut query = BuildQuery::all();
        match address {
            BuildsAddress::All => {}
            BuildsAddress::Builder(builder) => match self.resolve_builder(builder).await? {
                Some(b) => query.builderid = Some(b.builderid),
                None => return Ok(Vec::new()),
            },
            BuildsAddress::BuildRequest(id) => query.buildrequestid = Some(*id),
            BuildsAddress::Worker(id) => query.workerid = Some(*id),
        }

        // Address constraints claim their query slots first, then the spec
        // delegates whatever else the store can express.
        let mut spec = spec.clone();
        spec.pop_store_query(&mut query);

        let records = self.store.get_builds(&query).await?;
        let mut views = Vec::with_capacity(records.len());
        for record in &records {
            views.push(self.view_of(record, &spec).await?);
        }
        Ok(spec.apply_filters(views, BuildView::field))
    }

    // -----------------------------------------------------------------------
    // Update API
    // -----------------------------------------------------------------------

    /// Create a build row in the *created* state, stamped with the given
    /// master identity. Publishes nothing; callers emit the first
    /// notification via `generate_new_build_event` once they are ready.
    pub async fn add_build(
        &self,
        builderid: i64,
        buildrequestid: i64,
        workerid: i64,
        masterid: i64,
    ) -> Result<(i64, i64)> {
        let (buildid, number) = self
            .store
            .add_build(AddBuild {
                builderid,
                buildrequestid,
                workerid,
                masterid,
                state_string: "created".to_string(),
            })
            .await?;
        info!(buildid, builderid, number, "build created");
        Ok((buildid, number))
    }

    /// Fan the build's current representation out as a "new" event.
    pub async fn generate_new_build_event(&self, buildid: i64) -> Result<()> {
        self.generate_build_event(buildid, "new").await
    }

    /// Fan the build's current representation out as a "finished" event.
    pub async fn generate_finished_build_event(&self, buildid: i64) -> Result<()> {
        self.generate_build_event(buildid, "finished").await
    }

    /// Overwrite the human-readable status text. A silent store
    /// pass-through: no event is emitted here.
    pub async fn set_build_state_string(&self, buildid: i64, state_string: &str) -> Result<()> {
        debug!(buildid, state_string, "updating build state string");
        self.store
            .set_build_state_string(buildid, state_string)
            .await
            .map_err(frozen_as_state_violation)
    }

    /// Terminal lifecycle transition: set `complete_at` and `results` in
    /// one atomic step. At most one finish per build; a second call is a
    /// lifecycle violation.
    pub async fn finish_build(&self, buildid: i64, results: i64) -> Result<()> {
        info!(buildid, results, "finishing build");
        self.store
            .finish_build(buildid, results)
            .await
            .map_err(frozen_as_state_violation)
    }

    /// Set (or overwrite) one named build property.
    pub async fn set_build_property(
        &self,
        buildid: i64,
        name: &str,
        value: serde_json::Value,
        source: &str,
    ) -> Result<()> {
        Ok(self
            .store
            .set_build_property(buildid, name, value, source)
            .await?)
    }

    // -----------------------------------------------------------------------
    // Control actions
    // -----------------------------------------------------------------------

    /// Dispatch a named control action on the build a singular address
    /// resolves to. Unlike reads, control needs a target: an address that
    /// resolves to nothing is `NotFound`.
    pub async fn control(
        &self,
        action: &str,
        payload: &serde_json::Value,
        address: &BuildAddress,
    ) -> Result<ControlOutcome> {
        let build = self
            .get(address, &ResultSpec::new())
            .await?
            .ok_or_else(|| DataError::NotFound(format!("no build at {address:?}")))?;

        match action {
            "stop" => self.stop(&build, payload).await,
            "rebuild" => self.rebuild(&build).await,
            other => Err(DataError::UnknownAction(other.to_string())),
        }
    }

    /// Advisory stop: publish on the control topic and let the worker-side
    /// execution react. The build row is not touched.
    async fn stop(&self, build: &BuildView, payload: &serde_json::Value) -> Result<ControlOutcome> {
        let reason = match payload.get("reason") {
            None => "no reason",
            Some(serde_json::Value::String(s)) => s.as_str(),
            Some(other) => {
                return Err(DataError::InvalidPayload(format!(
                    "stop reason must be a string, got {other}"
                )))
            }
        };
        let topic = format!("control/builds/{}/stop", build.buildid);
        info!(buildid = build.buildid, reason, "requesting build stop");
        self.publisher
            .publish(&topic, serde_json::json!({ "reason": reason }))
            .await?;
        Ok(ControlOutcome::Acknowledged)
    }

    /// Pure orchestration pass-through: resolve the build's buildrequest
    /// and hand it to the external rebuild operation.
    async fn rebuild(&self, build: &BuildView) -> Result<ControlOutcome> {
        let buildrequest = self
            .relations
            .get_buildrequest(build.buildrequestid)
            .await?
            .ok_or_else(|| {
                DataError::NotFound(format!("buildrequest {}", build.buildrequestid))
            })?;
        let (buildsetid, buildrequestids) =
            self.rebuilder.rebuild_buildrequest(&buildrequest).await?;
        Ok(ControlOutcome::Rebuilt {
            buildsetid,
            buildrequestids,
        })
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    async fn resolve_builder(&self, builder: &BuilderRef) -> Result<Option<BuilderRecord>> {
        Ok(match builder {
            BuilderRef::Id(id) => self.relations.get_builder(*id).await?,
            BuilderRef::Name(name) => self.relations.find_builder_by_name(name).await?,
        })
    }

    async fn generate_build_event(&self, buildid: i64, kind: &str) -> Result<()> {
        let record = self
            .store
            .get_build(buildid)
            .await?
            .ok_or_else(|| DataError::NotFound(format!("build {buildid}")))?;
        let view = self.view_of(&record, &ResultSpec::new()).await?;
        fan_out_build_event(self.publisher.as_ref(), &view, kind).await?;
        Ok(())
    }

    async fn view_of(&self, record: &BuildRecord, spec: &ResultSpec) -> Result<BuildView> {
        let properties = self
            .store
            .get_build_properties(record.buildid)
            .await?
            .into_iter()
            .filter(|(name, _)| spec.keeps_property(name))
            .map(|(name, row)| (name, row.value))
            .collect();
        Ok(BuildView {
            buildid: record.buildid,
            number: record.number,
            builderid: record.builderid,
            buildrequestid: record.buildrequestid,
            workerid: record.workerid,
            masterid: record.masterid,
            complete: record.complete(),
            complete_at: record.complete_at.map(|t| t.timestamp()),
            started_at: record.started_at.timestamp(),
            results: record.results,
            state_string: record.state_string.clone(),
            properties,
        })
    }
}

/// A frozen row is a lifecycle violation at this layer; everything else
/// propagates as a store failure.
fn frozen_as_state_violation(err: StoreError) -> DataError {
    match err {
        StoreError::BuildAlreadyComplete { buildid } => {
            DataError::StateViolation(format!("build {buildid} is already complete"))
        }
        other => DataError::Store(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(complete_at: Option<i64>) -> BuildView {
        BuildView {
            buildid: 15,
            number: 5,
            builderid: 77,
            buildrequestid: 82,
            workerid: 13,
            masterid: 88,
            complete: complete_at.is_some(),
            complete_at,
            started_at: 0,
            results: complete_at.map(|_| 0),
            state_string: "created".to_string(),
            properties: BTreeMap::new(),
        }
    }

    #[test]
    fn fields_read_with_native_types() {
        let v = view(None);
        assert_eq!(v.field("builderid"), FieldValue::Int(77));
        assert_eq!(v.field("complete"), FieldValue::Bool(false));
        assert_eq!(v.field("complete_at"), FieldValue::Null);
        assert_eq!(v.field("results"), FieldValue::Null);
        assert_eq!(
            v.field("state_string"),
            FieldValue::Str("created".to_string())
        );
    }

    #[test]
    fn nullable_fields_surface_values_once_set() {
        let v = view(Some(1));
        assert_eq!(v.field("complete"), FieldValue::Bool(true));
        assert_eq!(v.field("complete_at"), FieldValue::Int(1));
        assert_eq!(v.field("results"), FieldValue::Int(0));
    }

    #[test]
    fn unknown_fields_read_as_null() {
        assert_eq!(view(None).field("no_such_field"), FieldValue::Null);
    }
}
