//! In-memory fakes for the store traits (testing only)
//!
//! Provides `MemoryBuildStore`, which satisfies both `BuildStore` and
//! `RelationLookup` without any external dependencies. Tests seed it with
//! fixture rows through the `seed_*` methods; seeded builds keep their
//! given ids and allocation continues above them.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::error::{StoreError, StoreResult};
use crate::schema::*;
use crate::store::{BuildStore, RelationLookup};

#[derive(Debug, Default)]
struct StoreState {
    // BTreeMaps keep iteration in id order, matching the query contract.
    builds: BTreeMap<i64, BuildRecord>,
    properties: HashMap<i64, HashMap<String, PropertyRow>>,
    builders: BTreeMap<i64, BuilderRecord>,
    buildrequests: BTreeMap<i64, BuildRequestRecord>,
    workers: BTreeMap<i64, WorkerRecord>,
}

/// In-memory build store backed by mutex-guarded maps.
#[derive(Debug, Default)]
pub struct MemoryBuildStore {
    state: Mutex<StoreState>,
}

impl MemoryBuildStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a builder fixture row.
    pub fn seed_builder(&self, builderid: i64, name: &str) {
        let mut state = self.state.lock().unwrap();
        state.builders.insert(
            builderid,
            BuilderRecord {
                builderid,
                name: name.to_string(),
            },
        );
    }

    /// Insert a worker fixture row.
    pub fn seed_worker(&self, workerid: i64, name: &str) {
        let mut state = self.state.lock().unwrap();
        state.workers.insert(workerid, WorkerRecord {
            workerid,
            name: name.to_string(),
        });
    }

    /// Insert a buildrequest fixture row.
    pub fn seed_buildrequest(&self, buildrequestid: i64, buildsetid: i64, builderid: i64) {
        let mut state = self.state.lock().unwrap();
        state.buildrequests.insert(buildrequestid, BuildRequestRecord {
            buildrequestid,
            buildsetid,
            builderid,
        });
    }

    /// Insert a build fixture row with its given ids. Rejects a row that
    /// would collide with an existing `(builderid, number)` pair.
    pub fn seed_build(&self, build: BuildRecord) -> StoreResult<()> {
        let mut state = self.state.lock().unwrap();
        if state
            .builds
            .values()
            .any(|b| b.builderid == build.builderid && b.number == build.number)
        {
            return Err(StoreError::DuplicateBuildNumber {
                builderid: build.builderid,
                number: build.number,
            });
        }
        state.builds.insert(build.buildid, build);
        Ok(())
    }

    /// Insert a property fixture row.
    pub fn seed_property(&self, buildid: i64, name: &str, value: serde_json::Value, source: &str) {
        let mut state = self.state.lock().unwrap();
        state.properties.entry(buildid).or_default().insert(
            name.to_string(),
            PropertyRow {
                value,
                source: source.to_string(),
            },
        );
    }
}

#[async_trait]
impl BuildStore for MemoryBuildStore {
    async fn get_build(&self, buildid: i64) -> StoreResult<Option<BuildRecord>> {
        let state = self.state.lock().unwrap();
        Ok(state.builds.get(&buildid).cloned())
    }

    async fn get_build_by_number(
        &self,
        builderid: i64,
        number: i64,
    ) -> StoreResult<Option<BuildRecord>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .builds
            .values()
            .find(|b| b.builderid == builderid && b.number == number)
            .cloned())
    }

    async fn get_builds(&self, query: &BuildQuery) -> StoreResult<Vec<BuildRecord>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .builds
            .values()
            .filter(|b| query.matches(b))
            .cloned()
            .collect())
    }

    async fn add_build(&self, build: AddBuild) -> StoreResult<(i64, i64)> {
        let mut state = self.state.lock().unwrap();
        let buildid = state.builds.keys().max().map_or(1, |id| id + 1);
        let number = state
            .builds
            .values()
            .filter(|b| b.builderid == build.builderid)
            .map(|b| b.number)
            .max()
            .map_or(1, |n| n + 1);
        state.builds.insert(buildid, BuildRecord {
            buildid,
            number,
            builderid: build.builderid,
            buildrequestid: build.buildrequestid,
            workerid: build.workerid,
            masterid: build.masterid,
            started_at: Utc::now(),
            complete_at: None,
            results: None,
            state_string: build.state_string,
        });
        Ok((buildid, number))
    }

    async fn set_build_state_string(&self, buildid: i64, state_string: &str) -> StoreResult<()> {
        let mut state = self.state.lock().unwrap();
        let build = state
            .builds
            .get_mut(&buildid)
            .ok_or(StoreError::BuildNotFound { buildid })?;
        if build.complete() {
            return Err(StoreError::BuildAlreadyComplete { buildid });
        }
        build.state_string = state_string.to_string();
        Ok(())
    }

    async fn finish_build(&self, buildid: i64, results: i64) -> StoreResult<()> {
        let mut state = self.state.lock().unwrap();
        let build = state
            .builds
            .get_mut(&buildid)
            .ok_or(StoreError::BuildNotFound { buildid })?;
        if build.complete() {
            return Err(StoreError::BuildAlreadyComplete { buildid });
        }
        build.complete_at = Some(Utc::now());
        build.results = Some(results);
        Ok(())
    }

    async fn get_build_properties(
        &self,
        buildid: i64,
    ) -> StoreResult<HashMap<String, PropertyRow>> {
        let state = self.state.lock().unwrap();
        Ok(state.properties.get(&buildid).cloned().unwrap_or_default())
    }

    async fn set_build_property(
        &self,
        buildid: i64,
        name: &str,
        value: serde_json::Value,
        source: &str,
    ) -> StoreResult<()> {
        let mut state = self.state.lock().unwrap();
        if !state.builds.contains_key(&buildid) {
            return Err(StoreError::BuildNotFound { buildid });
        }
        state.properties.entry(buildid).or_default().insert(
            name.to_string(),
            PropertyRow {
                value,
                source: source.to_string(),
            },
        );
        Ok(())
    }
}

#[async_trait]
impl RelationLookup for MemoryBuildStore {
    async fn get_builder(&self, builderid: i64) -> StoreResult<Option<BuilderRecord>> {
        let state = self.state.lock().unwrap();
        Ok(state.builders.get(&builderid).cloned())
    }

    async fn find_builder_by_name(&self, name: &str) -> StoreResult<Option<BuilderRecord>> {
        let state = self.state.lock().unwrap();
        Ok(state.builders.values().find(|b| b.name == name).cloned())
    }

    async fn get_buildrequest(
        &self,
        buildrequestid: i64,
    ) -> StoreResult<Option<BuildRequestRecord>> {
        let state = self.state.lock().unwrap();
        Ok(state.buildrequests.get(&buildrequestid).cloned())
    }

    async fn get_worker(&self, workerid: i64) -> StoreResult<Option<WorkerRecord>> {
        let state = self.state.lock().unwrap();
        Ok(state.workers.get(&workerid).cloned())
    }
}
