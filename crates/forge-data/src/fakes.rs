//! In-memory fakes for the data layer seams (testing only)
//!
//! `RecordingPublisher` captures every production so tests can assert on
//! topics, payloads, and delivery order; `FakeRebuilder` stands in for the
//! external rebuild operation and records what it was handed.

use std::sync::Mutex;

use async_trait::async_trait;

use forge_state::BuildRequestRecord;

use crate::builds::RebuildBuildRequest;
use crate::error::Result;
use crate::events::{EventPublisher, PublishError};

/// Event publisher that records `(topic, payload)` pairs in call order.
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    productions: Mutex<Vec<(String, serde_json::Value)>>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything published so far, in order.
    pub fn productions(&self) -> Vec<(String, serde_json::Value)> {
        self.productions.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(
        &self,
        topic: &str,
        payload: serde_json::Value,
    ) -> std::result::Result<(), PublishError> {
        let mut productions = self.productions.lock().unwrap();
        productions.push((topic.to_string(), payload));
        Ok(())
    }
}

/// Rebuild stand-in returning a canned `(buildsetid, buildrequestids)`
/// response and recording every buildrequest it was called with.
#[derive(Debug)]
pub struct FakeRebuilder {
    response: (i64, Vec<i64>),
    calls: Mutex<Vec<BuildRequestRecord>>,
}

impl FakeRebuilder {
    pub fn returning(buildsetid: i64, buildrequestids: Vec<i64>) -> Self {
        FakeRebuilder {
            response: (buildsetid, buildrequestids),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// The buildrequests handed to the rebuild operation, in call order.
    pub fn calls(&self) -> Vec<BuildRequestRecord> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RebuildBuildRequest for FakeRebuilder {
    async fn rebuild_buildrequest(
        &self,
        buildrequest: &BuildRequestRecord,
    ) -> Result<(i64, Vec<i64>)> {
        let mut calls = self.calls.lock().unwrap();
        calls.push(buildrequest.clone());
        Ok(self.response.clone())
    }
}
