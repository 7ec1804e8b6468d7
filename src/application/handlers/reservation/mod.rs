//! Reservation handlers.
//!
//! ## Commands
//! - Booking a seat (or joining the waitlist when full)
//! - Cancelling and removing bookings, with promotion of the waitlist head
//! - Leaving a waitlist
//! - Checking in
//!
//! ## Queries
//! - Class availability
//! - Class waitlist
//! - A user's bookings

mod cancel_reservation;
mod check_in;
mod create_reservation;
mod get_class_availability;
mod get_user_bookings;
mod get_waitlist;
mod leave_waitlist;
mod remove_reservation;

#[cfg(test)]
mod test_support;

// Commands
pub use cancel_reservation::{
    CancelReservationCommand, CancelReservationHandler, CancelReservationResult,
};
pub use check_in::{CheckInCommand, CheckInHandler, CheckInResult};
pub use create_reservation::{
    CreateReservationCommand, CreateReservationHandler, CreateReservationResult,
    ReservationOutcome,
};
pub use leave_waitlist::{LeaveWaitlistCommand, LeaveWaitlistHandler, LeaveWaitlistResult};
pub use remove_reservation::{
    RemoveReservationCommand, RemoveReservationHandler, RemoveReservationResult,
};

// Queries
pub use get_class_availability::{
    ClassAvailability, GetClassAvailabilityHandler, GetClassAvailabilityQuery,
    GetClassAvailabilityResult,
};
pub use get_user_bookings::{GetUserBookingsHandler, GetUserBookingsQuery, GetUserBookingsResult};
pub use get_waitlist::{GetWaitlistHandler, GetWaitlistQuery, GetWaitlistResult};
