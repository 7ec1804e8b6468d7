//! Adapters - Implementations of port interfaces.
//!
//! - `memory` - In-memory stores for tests and local runs
//! - `postgres` - sqlx-backed stores
//! - `events` - Notification sinks (in-memory capture, tracing)

pub mod events;
pub mod memory;
pub mod postgres;

pub use events::{InMemoryEventBus, TracingEventSink};
pub use memory::{
    InMemoryBookingRepository, InMemoryClassRepository, InMemorySubscriptionRepository,
    InMemoryWaitlistRepository,
};
