//! Subscription aggregate.
//!
//! A subscription entitles a user to book classes of one category, on the
//! equipment it grants, while it has credits left (or forever, for an
//! unlimited plan) and until its end date.
//!
//! # Design Decisions
//!
//! - **Lazy expiry**: there is no background sweep. An `Active` row whose
//!   end date has passed is reported as `Expired` by `effective_status`
//!   and persisted as such the next time the ledger touches it.
//! - **Optimistic concurrency**: `version` increments on every credit
//!   mutation; stores only apply an update whose expected version matches.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::domain::foundation::{StateMachine, SubscriptionId, Timestamp, UserId, ValidationError};
use crate::domain::studio::{Equipment, SubscriptionCategory};

/// Lifecycle status of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Expired,
}

impl StateMachine for SubscriptionStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        matches!(
            (self, target),
            (SubscriptionStatus::Active, SubscriptionStatus::Expired)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        match self {
            SubscriptionStatus::Active => vec![SubscriptionStatus::Expired],
            SubscriptionStatus::Expired => vec![],
        }
    }
}

/// Remaining class entitlement on a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "remaining", rename_all = "snake_case")]
pub enum CreditAllowance {
    Unlimited,
    Metered(u32),
}

impl CreditAllowance {
    pub fn is_unlimited(&self) -> bool {
        matches!(self, CreditAllowance::Unlimited)
    }

    /// Whether at least one class can still be booked.
    pub fn has_credit(&self) -> bool {
        match self {
            CreditAllowance::Unlimited => true,
            CreditAllowance::Metered(remaining) => *remaining > 0,
        }
    }

    /// Remaining metered credits; `None` for unlimited plans.
    pub fn remaining(&self) -> Option<u32> {
        match self {
            CreditAllowance::Unlimited => None,
            CreditAllowance::Metered(remaining) => Some(*remaining),
        }
    }
}

impl fmt::Display for CreditAllowance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CreditAllowance::Unlimited => f.write_str("unlimited"),
            CreditAllowance::Metered(n) => write!(f, "{} credits", n),
        }
    }
}

/// Why a credit mutation was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CreditError {
    #[error("No credits remaining on subscription {0}")]
    Insufficient(SubscriptionId),

    #[error("Subscription {0} is not active")]
    Inactive(SubscriptionId),
}

/// What a successful deduction did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deduction {
    /// A metered credit was consumed.
    Charged,
    /// Unlimited plan; nothing was consumed.
    Unmetered,
}

impl Deduction {
    /// Whether a credit was actually spent (the booking's funding flag).
    pub fn is_charged(&self) -> bool {
        matches!(self, Deduction::Charged)
    }
}

/// User subscription aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub user_id: UserId,
    pub status: SubscriptionStatus,
    pub category: SubscriptionCategory,
    pub equipment: Equipment,
    pub credits: CreditAllowance,
    pub ends_at: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub version: i64,
}

impl Subscription {
    /// Creates a new active subscription.
    ///
    /// # Errors
    ///
    /// Returns error if `ends_at` is not after the creation time.
    pub fn activate(
        id: SubscriptionId,
        user_id: UserId,
        category: SubscriptionCategory,
        equipment: Equipment,
        credits: CreditAllowance,
        ends_at: Timestamp,
    ) -> Result<Self, ValidationError> {
        let now = Timestamp::now();
        if !ends_at.is_after(&now) {
            return Err(ValidationError::invalid_format(
                "ends_at",
                "subscription must end in the future",
            ));
        }

        Ok(Self {
            id,
            user_id,
            status: SubscriptionStatus::Active,
            category,
            equipment,
            credits,
            ends_at,
            created_at: now,
            updated_at: now,
            version: 0,
        })
    }

    /// Status as of `now`, applying the end date lazily.
    pub fn effective_status(&self, now: Timestamp) -> SubscriptionStatus {
        match self.status {
            SubscriptionStatus::Active if now.is_after(&self.ends_at) => SubscriptionStatus::Expired,
            status => status,
        }
    }

    /// Active and not past its end date.
    pub fn is_usable(&self, now: Timestamp) -> bool {
        self.effective_status(now) == SubscriptionStatus::Active
    }

    /// Whether the stored status lags behind the end date.
    pub fn is_lapsed(&self, now: Timestamp) -> bool {
        self.status == SubscriptionStatus::Active && !self.is_usable(now)
    }

    /// Consumes one credit.
    ///
    /// # Errors
    ///
    /// `Inactive` if the subscription is not usable at `now`, `Insufficient`
    /// if a metered plan has no credits left. No state changes on error.
    pub fn deduct(&mut self, now: Timestamp) -> Result<Deduction, CreditError> {
        if !self.is_usable(now) {
            return Err(CreditError::Inactive(self.id));
        }

        match self.credits {
            CreditAllowance::Unlimited => Ok(Deduction::Unmetered),
            CreditAllowance::Metered(0) => Err(CreditError::Insufficient(self.id)),
            CreditAllowance::Metered(remaining) => {
                self.credits = CreditAllowance::Metered(remaining - 1);
                self.touch(now);
                Ok(Deduction::Charged)
            }
        }
    }

    /// Returns one credit. Unlimited plans are unchanged.
    ///
    /// Returns true if the balance changed.
    pub fn refund(&mut self, now: Timestamp) -> bool {
        match self.credits {
            CreditAllowance::Unlimited => false,
            CreditAllowance::Metered(remaining) => {
                self.credits = CreditAllowance::Metered(remaining.saturating_add(1));
                self.touch(now);
                true
            }
        }
    }

    /// Persists the lazily-evaluated expiry.
    ///
    /// # Errors
    ///
    /// Returns error if the subscription is already expired.
    pub fn expire(&mut self, now: Timestamp) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(SubscriptionStatus::Expired)?;
        self.touch(now);
        Ok(())
    }

    fn touch(&mut self, now: Timestamp) {
        self.updated_at = now;
        self.version += 1;
    }
}

/// Picks the subscription the ledger charges and refunds.
///
/// Among usable subscriptions the most recently created one wins; ties on
/// creation time fall back to the larger id so the choice is deterministic.
pub fn select_active(subscriptions: &[Subscription], now: Timestamp) -> Option<&Subscription> {
    subscriptions
        .iter()
        .filter(|s| s.is_usable(now))
        .max_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)))
}
