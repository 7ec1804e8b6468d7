//! Booking aggregate.
//!
//! A booking is a user's seat in a class. Rows are never deleted by a
//! user cancellation: they flip to `Cancelled` and may later be reused
//! when the same user books the same class again, which is why the
//! aggregate carries a `version` for conditional updates.
//!
//! The `funded` flag records whether a credit was actually spent to
//! create (or re-confirm) the booking. It is persisted with the row so
//! refund eligibility survives restarts.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{
    BookingId, ClassId, StateMachine, Timestamp, UserId, ValidationError,
};

/// Booking lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// Holds a seat.
    Confirmed,
    /// Seat released; the row may be reused by a later booking.
    Cancelled,
    /// Attended. Set by post-class processing.
    Completed,
    /// Did not attend. Set by post-class processing.
    NoShow,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
            BookingStatus::NoShow => "no_show",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl StateMachine for BookingStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use BookingStatus::*;
        matches!(
            (self, target),
            (Confirmed, Cancelled)
                | (Confirmed, Completed)
                | (Confirmed, NoShow)
                // Rebooking reuses the cancelled row
                | (Cancelled, Confirmed)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use BookingStatus::*;
        match self {
            Confirmed => vec![Cancelled, Completed, NoShow],
            Cancelled => vec![Confirmed],
            Completed | NoShow => vec![],
        }
    }
}

/// Who released the seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelledBy {
    User,
    Studio,
    Reception,
}

impl CancelledBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            CancelledBy::User => "user",
            CancelledBy::Studio => "studio",
            CancelledBy::Reception => "reception",
        }
    }
}

impl fmt::Display for CancelledBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Booking aggregate.
///
/// # Invariants
///
/// - at most one `Confirmed` booking per (user, class), enforced by stores
/// - `cancelled_by` is set iff the booking is `Cancelled`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub user_id: UserId,
    pub class_id: ClassId,
    pub status: BookingStatus,
    pub checked_in: bool,
    pub cancelled_by: Option<CancelledBy>,
    pub funded: bool,
    pub version: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub cancelled_at: Option<Timestamp>,
}

impl Booking {
    /// Creates a fresh confirmed booking.
    pub fn confirm(id: BookingId, user_id: UserId, class_id: ClassId, funded: bool) -> Self {
        let now = Timestamp::now();
        Self {
            id,
            user_id,
            class_id,
            status: BookingStatus::Confirmed,
            checked_in: false,
            cancelled_by: None,
            funded,
            version: 0,
            created_at: now,
            updated_at: now,
            cancelled_at: None,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        self.status == BookingStatus::Confirmed
    }

    /// Re-confirms a previously cancelled row for a new reservation.
    ///
    /// # Errors
    ///
    /// Returns error unless the booking is `Cancelled`.
    pub fn reconfirm(&mut self, funded: bool) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(BookingStatus::Confirmed)?;
        self.funded = funded;
        self.checked_in = false;
        self.cancelled_by = None;
        self.cancelled_at = None;
        self.touch();
        Ok(())
    }

    /// Releases the seat.
    ///
    /// # Errors
    ///
    /// Returns error unless the booking is `Confirmed`.
    pub fn cancel(&mut self, by: CancelledBy) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(BookingStatus::Cancelled)?;
        let now = Timestamp::now();
        self.cancelled_by = Some(by);
        self.cancelled_at = Some(now);
        self.touch();
        Ok(())
    }

    /// Marks the attendee as arrived. Idempotent.
    ///
    /// Returns true if the flag changed.
    ///
    /// # Errors
    ///
    /// Returns error unless the booking is `Confirmed`.
    pub fn check_in(&mut self) -> Result<bool, ValidationError> {
        if !self.is_confirmed() {
            return Err(ValidationError::invalid_format(
                "status",
                format!("cannot check in a {} booking", self.status),
            ));
        }
        if self.checked_in {
            return Ok(false);
        }
        self.checked_in = true;
        self.touch();
        Ok(true)
    }

    fn touch(&mut self) {
        self.updated_at = Timestamp::now();
        self.version += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn confirmed(funded: bool) -> Booking {
        Booking::confirm(
            BookingId::new(),
            UserId::new("member-7").unwrap(),
            ClassId::new(),
            funded,
        )
    }

    #[test]
    fn confirm_starts_with_clean_flags() {
        let booking = confirmed(true);
        assert!(booking.is_confirmed());
        assert!(booking.funded);
        assert!(!booking.checked_in);
        assert!(booking.cancelled_by.is_none());
        assert_eq!(booking.version, 0);
    }

    #[test]
    fn cancel_records_who_and_bumps_version() {
        let mut booking = confirmed(false);
        booking.cancel(CancelledBy::Reception).unwrap();
        assert_eq!(booking.status, BookingStatus::Cancelled);
        assert_eq!(booking.cancelled_by, Some(CancelledBy::Reception));
        assert!(booking.cancelled_at.is_some());
        assert_eq!(booking.version, 1);
    }

    #[test]
    fn cancel_twice_is_rejected() {
        let mut booking = confirmed(true);
        booking.cancel(CancelledBy::User).unwrap();
        assert!(booking.cancel(CancelledBy::User).is_err());
    }

    #[test]
    fn reconfirm_reuses_cancelled_row() {
        let mut booking = confirmed(true);
        booking.check_in().unwrap();
        booking.cancel(CancelledBy::User).unwrap();

        booking.reconfirm(false).unwrap();
        assert!(booking.is_confirmed());
        assert!(!booking.funded);
        assert!(!booking.checked_in);
        assert!(booking.cancelled_by.is_none());
        assert!(booking.cancelled_at.is_none());
    }

    #[test]
    fn reconfirm_requires_cancelled() {
        let mut booking = confirmed(true);
        assert!(booking.reconfirm(true).is_err());
    }

    #[test]
    fn check_in_is_idempotent() {
        let mut booking = confirmed(true);
        assert_eq!(booking.check_in(), Ok(true));
        assert_eq!(booking.check_in(), Ok(false));
        assert_eq!(booking.version, 1);
    }

    #[test]
    fn check_in_requires_confirmed() {
        let mut booking = confirmed(true);
        booking.cancel(CancelledBy::Studio).unwrap();
        assert!(booking.check_in().is_err());
    }

    #[test]
    fn completed_and_no_show_are_terminal() {
        assert!(BookingStatus::Completed.is_terminal());
        assert!(BookingStatus::NoShow.is_terminal());
        assert!(!BookingStatus::Cancelled.is_terminal());
    }
}
