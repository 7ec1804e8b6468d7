//! Reservation error taxonomy.
//!
//! | Category | Errors | Caller sees |
//! |----------|--------|-------------|
//! | Validation | NoActiveSubscription, CategoryMismatch, CapacityMismatch, NoCreditsRemaining, EquipmentAccessDenied, AlreadyBookedOrWaitlisted, ClassNotBookable, InvalidState | verbatim, never retried |
//! | Conflict | WaitlistContention, CreditContention | after the internal retry bound |
//! | NotFound | ClassNotFound, BookingNotFound, WaitlistEntryNotFound | verbatim |
//! | Infrastructure | Infrastructure | verbatim, retryable |

use thiserror::Error;

use crate::domain::foundation::{
    BookingId, ClassId, DomainError, ErrorCode, UserId, ValidationError, WaitlistEntryId,
};
use crate::domain::studio::{ClassCategory, Equipment, SubscriptionCategory};

/// Broad grouping of reservation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Conflict,
    NotFound,
    Infrastructure,
}

/// Errors surfaced by the reservation engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReservationError {
    #[error("User {user_id} has no active subscription")]
    NoActiveSubscription { user_id: UserId },

    #[error("A {subscription} subscription cannot book a {class} class")]
    CategoryMismatch {
        subscription: SubscriptionCategory,
        class: ClassCategory,
    },

    #[error("Personal class seats {class_capacity} but subscription covers a party of {party_size}")]
    CapacityMismatch { class_capacity: u32, party_size: u32 },

    #[error("User {user_id} has no credits remaining")]
    NoCreditsRemaining { user_id: UserId },

    #[error("Class requires {required} equipment but subscription grants {access}")]
    EquipmentAccessDenied { required: Equipment, access: Equipment },

    #[error("User {user_id} is already booked or waitlisted for class {class_id}")]
    AlreadyBookedOrWaitlisted { user_id: UserId, class_id: ClassId },

    #[error("Class {0} is not open for reservations")]
    ClassNotBookable(ClassId),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Could not claim a waitlist position for class {class_id} after {attempts} attempts")]
    WaitlistContention { class_id: ClassId, attempts: u32 },

    #[error("Could not update credits for user {user_id} after {attempts} attempts")]
    CreditContention { user_id: UserId, attempts: u32 },

    #[error("Class not found: {0}")]
    ClassNotFound(ClassId),

    #[error("Booking not found: {0}")]
    BookingNotFound(BookingId),

    #[error("Waitlist entry not found: {0}")]
    WaitlistEntryNotFound(WaitlistEntryId),

    #[error("Error: {0}")]
    Infrastructure(String),
}

impl ReservationError {
    pub fn infrastructure(message: impl Into<String>) -> Self {
        ReservationError::Infrastructure(message.into())
    }

    pub fn category(&self) -> ErrorCategory {
        use ReservationError::*;
        match self {
            NoActiveSubscription { .. }
            | CategoryMismatch { .. }
            | CapacityMismatch { .. }
            | NoCreditsRemaining { .. }
            | EquipmentAccessDenied { .. }
            | AlreadyBookedOrWaitlisted { .. }
            | ClassNotBookable(_)
            | InvalidState(_) => ErrorCategory::Validation,
            WaitlistContention { .. } | CreditContention { .. } => ErrorCategory::Conflict,
            ClassNotFound(_) | BookingNotFound(_) | WaitlistEntryNotFound(_) => {
                ErrorCategory::NotFound
            }
            Infrastructure(_) => ErrorCategory::Infrastructure,
        }
    }

    /// Returns the foundation error code for this error.
    pub fn code(&self) -> ErrorCode {
        use ReservationError::*;
        match self {
            ClassNotFound(_) => ErrorCode::ClassNotFound,
            BookingNotFound(_) => ErrorCode::BookingNotFound,
            WaitlistEntryNotFound(_) => ErrorCode::WaitlistEntryNotFound,
            AlreadyBookedOrWaitlisted { .. } => ErrorCode::DuplicateWaitlistEntry,
            InvalidState(_) => ErrorCode::InvalidStateTransition,
            WaitlistContention { .. } => ErrorCode::WaitlistPositionTaken,
            CreditContention { .. } => ErrorCode::ConcurrentModification,
            Infrastructure(_) => ErrorCode::DatabaseError,
            _ => ErrorCode::ValidationFailed,
        }
    }

    /// Whether the caller may usefully try again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Conflict | ErrorCategory::Infrastructure
        )
    }
}

impl From<DomainError> for ReservationError {
    fn from(err: DomainError) -> Self {
        ReservationError::Infrastructure(err.to_string())
    }
}

impl From<ValidationError> for ReservationError {
    fn from(err: ValidationError) -> Self {
        ReservationError::InvalidState(err.to_string())
    }
}

impl From<ReservationError> for DomainError {
    fn from(err: ReservationError) -> Self {
        DomainError::new(err.code(), err.to_string())
    }
}
