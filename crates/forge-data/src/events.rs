//! Lifecycle event fan-out
//!
//! A build event is one logical occurrence delivered to every topic path
//! derived from the build's relationships. All addresses receive the same
//! serialized payload, in a fixed order, so downstream consumers and tests
//! can rely on deterministic delivery.

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::builds::BuildView;

/// Errors from event publication
#[derive(Error, Debug)]
pub enum PublishError {
    /// The payload could not be serialized
    #[error("Event payload encoding failed: {0}")]
    Encode(String),

    /// The underlying bus rejected a delivery; fatal to the call
    #[error("Event delivery failed on {topic}: {reason}")]
    Delivery { topic: String, reason: String },
}

/// Publish capability, injected into the resource type at construction.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, topic: &str, payload: serde_json::Value)
        -> Result<(), PublishError>;
}

/// The topic paths one build event fans out to, in delivery order:
/// builder-scoped, then global, then worker-scoped.
pub fn build_event_topics(view: &BuildView, kind: &str) -> [String; 3] {
    [
        format!(
            "builders/{}/builds/{}/{kind}",
            view.builderid, view.number
        ),
        format!("builds/{}/{kind}", view.buildid),
        format!(
            "workers/{}/builds/{}/{kind}",
            view.workerid, view.buildid
        ),
    ]
}

/// Fan a build representation out to all derived topics as one logical
/// event. Delivery failure propagates immediately; no retry.
pub async fn fan_out_build_event(
    publisher: &dyn EventPublisher,
    view: &BuildView,
    kind: &str,
) -> Result<(), PublishError> {
    let payload = serde_json::to_value(view).map_err(|e| PublishError::Encode(e.to_string()))?;
    for topic in build_event_topics(view, kind) {
        debug!(topic = %topic, buildid = view.buildid, "publishing build event");
        publisher.publish(&topic, payload.clone()).await?;
    }
    Ok(())
}
