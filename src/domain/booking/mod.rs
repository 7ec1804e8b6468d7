//! Booking domain module.
//!
//! The booking aggregate, the reservation error taxonomy and the events
//! handed to the notification sink.

mod aggregate;
mod errors;
mod events;

pub use aggregate::{Booking, BookingStatus, CancelledBy};
pub use errors::{ErrorCategory, ReservationError};
pub use events::ReservationEvent;
