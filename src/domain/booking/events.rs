//! Reservation domain events.
//!
//! Handed to the notification sink. Every event carries the user it is
//! addressed to, the class, and the display fields a push message needs.
//! Events are named in past tense and routed by their snake_case type.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    BookingId, ClassId, DomainEvent, EventId, Timestamp, UserId, WaitlistEntryId,
};
use crate::domain::studio::ClassDisplay;

use super::CancelledBy;

/// Events emitted by the reservation engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReservationEvent {
    /// A seat was confirmed directly.
    ClassBooked {
        event_id: EventId,
        booking_id: BookingId,
        user_id: UserId,
        class_id: ClassId,
        #[serde(flatten)]
        display: ClassDisplay,
        occurred_at: Timestamp,
    },

    /// The booking by `user_id` took the last seat.
    ClassFull {
        event_id: EventId,
        user_id: UserId,
        class_id: ClassId,
        capacity: u32,
        #[serde(flatten)]
        display: ClassDisplay,
        occurred_at: Timestamp,
    },

    /// A booking was cancelled or removed.
    ClassCancelled {
        event_id: EventId,
        booking_id: BookingId,
        user_id: UserId,
        class_id: ClassId,
        cancelled_by: CancelledBy,
        #[serde(flatten)]
        display: ClassDisplay,
        occurred_at: Timestamp,
    },

    /// The user was added to the waitlist.
    WaitlistJoined {
        event_id: EventId,
        entry_id: WaitlistEntryId,
        user_id: UserId,
        class_id: ClassId,
        position: u32,
        #[serde(flatten)]
        display: ClassDisplay,
        occurred_at: Timestamp,
    },

    /// The user's waitlist position improved after a removal ahead of them.
    WaitlistMovedUp {
        event_id: EventId,
        entry_id: WaitlistEntryId,
        user_id: UserId,
        class_id: ClassId,
        position: u32,
        #[serde(flatten)]
        display: ClassDisplay,
        occurred_at: Timestamp,
    },

    /// The waitlist head received a freed seat.
    WaitlistPromoted {
        event_id: EventId,
        booking_id: BookingId,
        user_id: UserId,
        class_id: ClassId,
        #[serde(flatten)]
        display: ClassDisplay,
        occurred_at: Timestamp,
    },
}

impl ReservationEvent {
    /// User the notification is addressed to.
    pub fn user_id(&self) -> &UserId {
        use ReservationEvent::*;
        match self {
            ClassBooked { user_id, .. }
            | ClassFull { user_id, .. }
            | ClassCancelled { user_id, .. }
            | WaitlistJoined { user_id, .. }
            | WaitlistMovedUp { user_id, .. }
            | WaitlistPromoted { user_id, .. } => user_id,
        }
    }

    pub fn class_id(&self) -> ClassId {
        use ReservationEvent::*;
        match self {
            ClassBooked { class_id, .. }
            | ClassFull { class_id, .. }
            | ClassCancelled { class_id, .. }
            | WaitlistJoined { class_id, .. }
            | WaitlistMovedUp { class_id, .. }
            | WaitlistPromoted { class_id, .. } => *class_id,
        }
    }
}

impl DomainEvent for ReservationEvent {
    fn event_type(&self) -> &'static str {
        use ReservationEvent::*;
        match self {
            ClassBooked { .. } => "class_booked",
            ClassFull { .. } => "class_full",
            ClassCancelled { .. } => "class_cancelled",
            WaitlistJoined { .. } => "waitlist_joined",
            WaitlistMovedUp { .. } => "waitlist_moved_up",
            WaitlistPromoted { .. } => "waitlist_promoted",
        }
    }

    fn aggregate_id(&self) -> String {
        self.class_id().to_string()
    }

    fn aggregate_type(&self) -> &'static str {
        "StudioClass"
    }

    fn occurred_at(&self) -> Timestamp {
        use ReservationEvent::*;
        match self {
            ClassBooked { occurred_at, .. }
            | ClassFull { occurred_at, .. }
            | ClassCancelled { occurred_at, .. }
            | WaitlistJoined { occurred_at, .. }
            | WaitlistMovedUp { occurred_at, .. }
            | WaitlistPromoted { occurred_at, .. } => *occurred_at,
        }
    }

    fn event_id(&self) -> EventId {
        use ReservationEvent::*;
        match self {
            ClassBooked { event_id, .. }
            | ClassFull { event_id, .. }
            | ClassCancelled { event_id, .. }
            | WaitlistJoined { event_id, .. }
            | WaitlistMovedUp { event_id, .. }
            | WaitlistPromoted { event_id, .. } => event_id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::SerializableDomainEvent;

    fn display() -> ClassDisplay {
        ClassDisplay {
            class_name: "Reformer Basics".to_string(),
            date: "2026-03-14".to_string(),
            time: "18:30".to_string(),
        }
    }

    fn joined(position: u32) -> ReservationEvent {
        ReservationEvent::WaitlistJoined {
            event_id: EventId::new(),
            entry_id: WaitlistEntryId::new(),
            user_id: UserId::new("member-3").unwrap(),
            class_id: ClassId::new(),
            position,
            display: display(),
            occurred_at: Timestamp::now(),
        }
    }

    #[test]
    fn event_types_are_snake_case() {
        assert_eq!(joined(1).event_type(), "waitlist_joined");
    }

    #[test]
    fn envelope_is_keyed_by_class() {
        let event = joined(4);
        let envelope = event.to_envelope().unwrap();
        assert_eq!(envelope.aggregate_id, event.class_id().to_string());
        assert_eq!(envelope.aggregate_type, "StudioClass");
        assert_eq!(envelope.event_type, "waitlist_joined");
    }

    #[test]
    fn payload_carries_display_fields_flat() {
        let envelope = joined(2).to_envelope().unwrap();
        assert_eq!(envelope.payload["type"], "waitlist_joined");
        assert_eq!(envelope.payload["position"], 2);
        assert_eq!(envelope.payload["class_name"], "Reformer Basics");
        assert_eq!(envelope.payload["date"], "2026-03-14");
        assert_eq!(envelope.payload["time"], "18:30");
    }

    #[test]
    fn payload_deserializes_back() {
        let event = joined(3);
        let envelope = event.to_envelope().unwrap();
        let back: ReservationEvent = envelope.payload_as().unwrap();
        assert_eq!(back, event);
    }
}
