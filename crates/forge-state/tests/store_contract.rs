//! Trait contract tests for BuildStore and RelationLookup.
//!
//! These tests verify the behavioral contracts of the store traits using
//! the in-memory fake. Any conforming backend must pass these.

use chrono::DateTime;
use forge_state::fakes::MemoryBuildStore;
use forge_state::{AddBuild, BuildQuery, BuildRecord, BuildStore, RelationLookup, StoreError};

fn add_build(builderid: i64) -> AddBuild {
    AddBuild {
        builderid,
        buildrequestid: 82,
        workerid: 13,
        masterid: 88,
        state_string: "created".to_string(),
    }
}

fn fixture_build(buildid: i64, builderid: i64, number: i64, complete_at: Option<i64>) -> BuildRecord {
    BuildRecord {
        buildid,
        number,
        builderid,
        buildrequestid: 82,
        workerid: 13,
        masterid: 88,
        started_at: DateTime::from_timestamp(0, 0).unwrap(),
        complete_at: complete_at.map(|s| DateTime::from_timestamp(s, 0).unwrap()),
        results: complete_at.map(|_| 0),
        state_string: "created".to_string(),
    }
}

// ===========================================================================
// Identity allocation
// ===========================================================================

#[tokio::test]
async fn add_build_allocates_unique_buildids() {
    let store = MemoryBuildStore::new();

    let (id1, _) = store.add_build(add_build(77)).await.unwrap();
    let (id2, _) = store.add_build(add_build(78)).await.unwrap();

    assert_ne!(id1, id2);
}

#[tokio::test]
async fn add_build_numbers_are_monotonic_per_builder() {
    let store = MemoryBuildStore::new();

    let (_, n1) = store.add_build(add_build(77)).await.unwrap();
    let (_, n2) = store.add_build(add_build(78)).await.unwrap();
    let (_, n3) = store.add_build(add_build(77)).await.unwrap();

    assert_eq!(n1, 1);
    assert_eq!(n2, 1); // independent sequence per builder
    assert_eq!(n3, 2);
}

#[tokio::test]
async fn add_build_continues_above_seeded_rows() {
    let store = MemoryBuildStore::new();
    store.seed_build(fixture_build(15, 77, 5, None)).unwrap();

    let (buildid, number) = store.add_build(add_build(77)).await.unwrap();

    assert_eq!(buildid, 16);
    assert_eq!(number, 6);
}

#[tokio::test]
async fn seed_build_rejects_duplicate_builder_number() {
    let store = MemoryBuildStore::new();
    store.seed_build(fixture_build(13, 77, 3, None)).unwrap();

    let err = store.seed_build(fixture_build(14, 77, 3, None)).unwrap_err();
    assert!(matches!(
        err,
        StoreError::DuplicateBuildNumber {
            builderid: 77,
            number: 3
        }
    ));

    // The colliding row was not inserted; the pair still resolves uniquely.
    let builds = store.get_builds(&BuildQuery::all()).await.unwrap();
    assert_eq!(builds.len(), 1);
    let build = store.get_build_by_number(77, 3).await.unwrap().unwrap();
    assert_eq!(build.buildid, 13);
}

#[tokio::test]
async fn add_build_initializes_lifecycle_fields() {
    let store = MemoryBuildStore::new();
    let (buildid, _) = store.add_build(add_build(77)).await.unwrap();

    let build = store.get_build(buildid).await.unwrap().unwrap();
    assert_eq!(build.state_string, "created");
    assert!(!build.complete());
    assert!(build.complete_at.is_none());
    assert!(build.results.is_none());
    assert_eq!(build.masterid, 88);
}

// ===========================================================================
// Lookup and query
// ===========================================================================

#[tokio::test]
async fn get_build_missing_is_none() {
    let store = MemoryBuildStore::new();
    assert!(store.get_build(9999).await.unwrap().is_none());
}

#[tokio::test]
async fn get_build_by_number_finds_the_pair() {
    let store = MemoryBuildStore::new();
    store.seed_build(fixture_build(13, 77, 3, None)).unwrap();
    store.seed_build(fixture_build(15, 77, 5, None)).unwrap();

    let build = store.get_build_by_number(77, 5).await.unwrap().unwrap();
    assert_eq!(build.buildid, 15);

    assert!(store.get_build_by_number(77, 44).await.unwrap().is_none());
    assert!(store.get_build_by_number(999, 5).await.unwrap().is_none());
}

#[tokio::test]
async fn get_builds_returns_id_order() {
    let store = MemoryBuildStore::new();
    store.seed_build(fixture_build(15, 78, 5, None)).unwrap();
    store.seed_build(fixture_build(13, 77, 3, None)).unwrap();
    store.seed_build(fixture_build(14, 77, 4, None)).unwrap();

    let builds = store.get_builds(&BuildQuery::all()).await.unwrap();
    let ids: Vec<i64> = builds.iter().map(|b| b.buildid).collect();
    assert_eq!(ids, vec![13, 14, 15]);
}

#[tokio::test]
async fn get_builds_applies_query_constraints() {
    let store = MemoryBuildStore::new();
    store.seed_build(fixture_build(13, 77, 3, None)).unwrap();
    store.seed_build(fixture_build(14, 77, 4, None)).unwrap();
    store.seed_build(fixture_build(15, 78, 5, Some(1))).unwrap();

    let query = BuildQuery {
        builderid: Some(77),
        ..BuildQuery::all()
    };
    let builds = store.get_builds(&query).await.unwrap();
    assert_eq!(builds.len(), 2);

    let complete = BuildQuery {
        complete: Some(true),
        ..BuildQuery::all()
    };
    let builds = store.get_builds(&complete).await.unwrap();
    assert_eq!(builds.len(), 1);
    assert_eq!(builds[0].buildid, 15);
}

// ===========================================================================
// Lifecycle mutations
// ===========================================================================

#[tokio::test]
async fn set_build_state_string_overwrites_text() {
    let store = MemoryBuildStore::new();
    let (buildid, _) = store.add_build(add_build(77)).await.unwrap();

    store.set_build_state_string(buildid, "compiling").await.unwrap();

    let build = store.get_build(buildid).await.unwrap().unwrap();
    assert_eq!(build.state_string, "compiling");
}

#[tokio::test]
async fn set_build_state_string_missing_build_errors() {
    let store = MemoryBuildStore::new();
    let err = store.set_build_state_string(9999, "x").await.unwrap_err();
    assert!(matches!(err, StoreError::BuildNotFound { buildid: 9999 }));
}

#[tokio::test]
async fn finish_build_sets_results_and_complete_at_together() {
    let store = MemoryBuildStore::new();
    let (buildid, _) = store.add_build(add_build(77)).await.unwrap();

    store.finish_build(buildid, 0).await.unwrap();

    let build = store.get_build(buildid).await.unwrap().unwrap();
    assert!(build.complete());
    assert!(build.complete_at.is_some());
    assert_eq!(build.results, Some(0));
}

#[tokio::test]
async fn finish_build_at_most_once() {
    let store = MemoryBuildStore::new();
    let (buildid, _) = store.add_build(add_build(77)).await.unwrap();
    store.finish_build(buildid, 0).await.unwrap();

    let err = store.finish_build(buildid, 2).await.unwrap_err();
    assert!(matches!(err, StoreError::BuildAlreadyComplete { .. }));

    // The first result stands.
    let build = store.get_build(buildid).await.unwrap().unwrap();
    assert_eq!(build.results, Some(0));
}

#[tokio::test]
async fn finished_build_state_string_is_frozen() {
    let store = MemoryBuildStore::new();
    let (buildid, _) = store.add_build(add_build(77)).await.unwrap();
    store.finish_build(buildid, 0).await.unwrap();

    let err = store.set_build_state_string(buildid, "late").await.unwrap_err();
    assert!(matches!(err, StoreError::BuildAlreadyComplete { .. }));
}

// ===========================================================================
// Properties
// ===========================================================================

#[tokio::test]
async fn properties_empty_by_default() {
    let store = MemoryBuildStore::new();
    let (buildid, _) = store.add_build(add_build(77)).await.unwrap();

    let props = store.get_build_properties(buildid).await.unwrap();
    assert!(props.is_empty());
}

#[tokio::test]
async fn set_build_property_overwrites_by_name() {
    let store = MemoryBuildStore::new();
    let (buildid, _) = store.add_build(add_build(77)).await.unwrap();

    store
        .set_build_property(buildid, "reason", serde_json::json!("force build"), "Force Build Form")
        .await
        .unwrap();
    store
        .set_build_property(buildid, "reason", serde_json::json!("rebuild"), "Rebuild Button")
        .await
        .unwrap();

    let props = store.get_build_properties(buildid).await.unwrap();
    assert_eq!(props.len(), 1);
    assert_eq!(props["reason"].value, serde_json::json!("rebuild"));
    assert_eq!(props["reason"].source, "Rebuild Button");
}

#[tokio::test]
async fn set_build_property_missing_build_errors() {
    let store = MemoryBuildStore::new();
    let err = store
        .set_build_property(9999, "reason", serde_json::json!("x"), "test")
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::BuildNotFound { .. }));
}

// ===========================================================================
// Relation lookups
// ===========================================================================

#[tokio::test]
async fn builder_lookup_by_id_and_name() {
    let store = MemoryBuildStore::new();
    store.seed_builder(77, "builder77");

    let by_id = store.get_builder(77).await.unwrap().unwrap();
    assert_eq!(by_id.name, "builder77");

    let by_name = store.find_builder_by_name("builder77").await.unwrap().unwrap();
    assert_eq!(by_name.builderid, 77);

    assert!(store.get_builder(999).await.unwrap().is_none());
    assert!(store.find_builder_by_name("nope").await.unwrap().is_none());
}

#[tokio::test]
async fn buildrequest_and_worker_lookup() {
    let store = MemoryBuildStore::new();
    store.seed_buildrequest(82, 8822, 77);
    store.seed_worker(13, "wrk");

    let br = store.get_buildrequest(82).await.unwrap().unwrap();
    assert_eq!(br.buildsetid, 8822);

    let worker = store.get_worker(13).await.unwrap().unwrap();
    assert_eq!(worker.name, "wrk");

    assert!(store.get_buildrequest(899).await.unwrap().is_none());
    assert!(store.get_worker(99).await.unwrap().is_none());
}
