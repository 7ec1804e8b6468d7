//! Application layer - Engine components, handlers and the manager facade.
//!
//! Commands (create, cancel, remove, leave, check in) mutate reservations;
//! queries (availability, waitlist, user bookings) only read.

pub mod engine;
pub mod handlers;
mod manager;

pub use engine::{EngineContext, ReservationPorts};
pub use handlers::*;
pub use manager::ReservationManager;
