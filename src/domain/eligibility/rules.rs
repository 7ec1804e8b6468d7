//! Booking eligibility rules.
//!
//! Checks run in a fixed order and stop at the first failure:
//!
//! 1. an active, unexpired subscription exists
//! 2. the subscription category matches the class category
//! 3. personal classes seat exactly the subscription's party size
//! 4. a metered subscription has credit left
//! 5. the subscription's equipment access satisfies the class
//!
//! A staff override skips checks 1 to 4. Equipment is still checked when
//! the user happens to hold an active subscription.

use crate::domain::booking::ReservationError;
use crate::domain::foundation::{Timestamp, UserId};
use crate::domain::studio::{ClassCategory, StudioClass};
use crate::domain::subscription::Subscription;

/// Whether staff bypassed the subscription checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Override {
    #[default]
    None,
    Staff,
}

impl Override {
    pub fn is_active(&self) -> bool {
        matches!(self, Override::Staff)
    }
}

/// Validates a booking attempt.
///
/// `subscription` is the user's selected subscription, if any; it is
/// re-checked against `now` so a lapsed one counts as absent.
///
/// # Errors
///
/// The first failing rule's `ReservationError`.
pub fn check(
    user_id: &UserId,
    subscription: Option<&Subscription>,
    class: &StudioClass,
    now: Timestamp,
    override_: Override,
) -> Result<(), ReservationError> {
    let active = subscription.filter(|s| s.is_usable(now));

    if !override_.is_active() {
        let sub = active.ok_or_else(|| ReservationError::NoActiveSubscription {
            user_id: user_id.clone(),
        })?;

        if sub.category.class_category() != class.category {
            return Err(ReservationError::CategoryMismatch {
                subscription: sub.category,
                class: class.category,
            });
        }

        if class.category == ClassCategory::Personal {
            if let Some(party) = sub.category.party_size() {
                if party.seats() != class.capacity {
                    return Err(ReservationError::CapacityMismatch {
                        class_capacity: class.capacity,
                        party_size: party.seats(),
                    });
                }
            }
        }

        if !sub.credits.has_credit() {
            return Err(ReservationError::NoCreditsRemaining {
                user_id: user_id.clone(),
            });
        }
    }

    if let Some(sub) = active {
        if !sub.equipment.satisfies(class.equipment) {
            return Err(ReservationError::EquipmentAccessDenied {
                required: class.equipment,
                access: sub.equipment,
            });
        }
    }

    Ok(())
}
