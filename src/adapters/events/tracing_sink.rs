//! Event sink that writes envelopes to the log.
//!
//! For deployments without a push-delivery backend wired in.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, EventEnvelope};
use crate::ports::EventPublisher;

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl TracingEventSink {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EventPublisher for TracingEventSink {
    async fn publish(&self, event: EventEnvelope) -> Result<(), DomainError> {
        tracing::info!(
            event_id = %event.event_id,
            event_type = %event.event_type,
            class_id = %event.aggregate_id,
            payload = %event.payload,
            "reservation event"
        );
        Ok(())
    }

    async fn publish_all(&self, events: Vec<EventEnvelope>) -> Result<(), DomainError> {
        for event in events {
            self.publish(event).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn publishing_never_fails() {
        let sink = TracingEventSink::new();
        let envelope = EventEnvelope::new("class_full", "c-1", "StudioClass", json!({}));
        assert!(sink.publish(envelope.clone()).await.is_ok());
        assert!(sink.publish_all(vec![envelope]).await.is_ok());
    }
}
