//! Best-effort event emission.
//!
//! Reservation operations never fail because the notification sink did.
//! Serialization and publish errors are logged at `warn` and dropped.

use std::sync::Arc;

use crate::domain::booking::ReservationEvent;
use crate::domain::foundation::{DomainEvent, SerializableDomainEvent};
use crate::ports::EventPublisher;

#[derive(Clone)]
pub struct Notifier {
    publisher: Arc<dyn EventPublisher>,
}

impl Notifier {
    pub fn new(publisher: Arc<dyn EventPublisher>) -> Self {
        Self { publisher }
    }

    /// Publishes one event, logging instead of failing.
    pub async fn emit(&self, event: ReservationEvent) {
        let envelope = match event.to_envelope() {
            Ok(envelope) => envelope.with_user_id(event.user_id().as_str()),
            Err(e) => {
                tracing::warn!(
                    event_type = event.event_type(),
                    class_id = %event.class_id(),
                    error = %e,
                    "failed to encode reservation event"
                );
                return;
            }
        };

        let event_type = envelope.event_type.clone();
        if let Err(e) = self.publisher.publish(envelope).await {
            tracing::warn!(
                event_type = %event_type,
                class_id = %event.class_id(),
                user_id = %event.user_id(),
                error = %e,
                "failed to publish reservation event"
            );
        }
    }

    pub async fn emit_all(&self, events: impl IntoIterator<Item = ReservationEvent>) {
        for event in events {
            self.emit(event).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryEventBus;
    use crate::domain::foundation::{BookingId, ClassId, EventId, Timestamp, UserId};
    use crate::domain::studio::ClassDisplay;

    fn booked() -> ReservationEvent {
        ReservationEvent::ClassBooked {
            event_id: EventId::new(),
            booking_id: BookingId::new(),
            user_id: UserId::new("member-1").unwrap(),
            class_id: ClassId::new(),
            display: ClassDisplay {
                class_name: "Pilates Mat".to_string(),
                date: "2026-05-02".to_string(),
                time: "07:00".to_string(),
            },
            occurred_at: Timestamp::now(),
        }
    }

    #[tokio::test]
    async fn emits_envelope_tagged_with_user() {
        let bus = Arc::new(InMemoryEventBus::new());
        let notifier = Notifier::new(bus.clone());

        let event = booked();
        notifier.emit(event.clone()).await;

        let published = bus.published_events();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].event_type, event.event_type());
        assert_eq!(published[0].metadata.user_id.as_deref(), Some("member-1"));
    }

    #[tokio::test]
    async fn publish_failure_is_swallowed() {
        let bus = Arc::new(InMemoryEventBus::failing());
        let notifier = Notifier::new(bus.clone());

        notifier.emit_all(vec![booked(), booked()]).await;
        assert_eq!(bus.event_count(), 0);
    }
}
