//! Booking repository port.
//!
//! # Design
//!
//! - **Capacity-safe insert**: `confirm_if_room` counts and inserts as one
//!   atomic step. It is the store-level half of the capacity guarantee and
//!   must refuse, never overshoot, when the class is full.
//! - **Row reuse**: a user rebooking a class gets their cancelled row back
//!   rather than a second row for the pair.
//! - **Conditional updates**: `compare_and_set` applies a change only when
//!   the stored version still matches.

use async_trait::async_trait;

use crate::domain::booking::Booking;
use crate::domain::foundation::{BookingId, ClassId, DomainError, UserId};

/// Result of an attempt to claim a seat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeatClaim {
    /// A seat was claimed; the booking is new or a reused cancelled row.
    Confirmed(Booking),
    /// The user already held a confirmed booking; nothing changed.
    AlreadyConfirmed(Booking),
    /// Confirmed count had reached capacity; nothing changed.
    Full,
}

/// Repository port for bookings.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn find_by_id(&self, id: &BookingId) -> Result<Option<Booking>, DomainError>;

    /// The booking row for a (user, class) pair.
    ///
    /// A confirmed row is preferred over a cancelled or finished one.
    async fn find_for_user_and_class(
        &self,
        user_id: &UserId,
        class_id: &ClassId,
    ) -> Result<Option<Booking>, DomainError>;

    /// Number of confirmed bookings for a class.
    async fn count_confirmed(&self, class_id: &ClassId) -> Result<u32, DomainError>;

    async fn list_for_class(&self, class_id: &ClassId) -> Result<Vec<Booking>, DomainError>;

    /// All bookings of a user, newest first.
    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Booking>, DomainError>;

    /// Atomically confirm a seat if the class has room.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` on persistence failure; no seat is claimed
    async fn confirm_if_room(
        &self,
        user_id: &UserId,
        class_id: &ClassId,
        funded: bool,
        capacity: u32,
    ) -> Result<SeatClaim, DomainError>;

    /// Store `booking` only if the stored version equals `expected_version`.
    ///
    /// Returns false when the row changed underneath the caller.
    ///
    /// # Errors
    ///
    /// - `BookingNotFound` if the row no longer exists
    /// - `DatabaseError` on persistence failure
    async fn compare_and_set(
        &self,
        booking: &Booking,
        expected_version: i64,
    ) -> Result<bool, DomainError>;

    /// Hard delete. Returns false if the row was already gone.
    async fn delete(&self, id: &BookingId) -> Result<bool, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booking_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn BookingRepository) {}
    }
}
