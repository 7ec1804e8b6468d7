//! Foundation module - Shared domain primitives.
//!
//! Contains identifiers, the timestamp value object, error types, the
//! event envelope and the state machine trait used across the studio
//! reservation domain.

mod errors;
mod events;
mod ids;
mod state_machine;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use events::{DomainEvent, EventEnvelope, EventId, EventMetadata, SerializableDomainEvent};
pub use ids::{BookingId, ClassId, InstructorId, SubscriptionId, UserId, WaitlistEntryId};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
