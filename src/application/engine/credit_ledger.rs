//! Credit ledger.
//!
//! Deducts and refunds class credits on a user's selected subscription
//! (see [`select_active`]). Every write is a version-checked update that is
//! retried from a fresh read when another writer got there first.
//!
//! Refunds never fail the caller. When no subscription is active at
//! refund time the credit lands on the user's fallback balance.

use std::sync::Arc;
use thiserror::Error;

use crate::domain::booking::ReservationError;
use crate::domain::foundation::{DomainError, SubscriptionId, Timestamp, UserId};
use crate::domain::subscription::{select_active, CreditError, Deduction, Subscription};
use crate::ports::SubscriptionRepository;

/// Why a deduction or refund did not go through.
#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    #[error("User {0} has no active subscription")]
    NoActiveSubscription(UserId),

    #[error("User {0} has no credits remaining")]
    InsufficientCredit(UserId),

    #[error("Credit update for user {user_id} lost {attempts} races")]
    Contention { user_id: UserId, attempts: u32 },

    #[error(transparent)]
    Store(#[from] DomainError),
}

impl From<LedgerError> for ReservationError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::NoActiveSubscription(user_id) => {
                ReservationError::NoActiveSubscription { user_id }
            }
            LedgerError::InsufficientCredit(user_id) => {
                ReservationError::NoCreditsRemaining { user_id }
            }
            LedgerError::Contention { user_id, attempts } => {
                ReservationError::CreditContention { user_id, attempts }
            }
            LedgerError::Store(e) => e.into(),
        }
    }
}

/// Record of a successful deduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Charge {
    pub subscription_id: SubscriptionId,
    pub deduction: Deduction,
}

impl Charge {
    /// Whether a credit was actually spent.
    pub fn is_charged(&self) -> bool {
        self.deduction.is_charged()
    }
}

/// Where a refunded credit went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefundOutcome {
    /// Returned to the active metered subscription.
    Subscription {
        subscription_id: SubscriptionId,
        remaining: u32,
    },
    /// Active subscription is unlimited; nothing to return.
    Unmetered { subscription_id: SubscriptionId },
    /// No active subscription; credited to the fallback balance.
    Fallback { balance: u32 },
    /// The refund could not be applied. Logged, never propagated.
    Failed { reason: String },
}

impl RefundOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, RefundOutcome::Failed { .. })
    }
}

#[derive(Clone)]
pub struct CreditLedger {
    subscriptions: Arc<dyn SubscriptionRepository>,
    max_attempts: u32,
}

impl CreditLedger {
    pub fn new(subscriptions: Arc<dyn SubscriptionRepository>, max_attempts: u32) -> Self {
        Self {
            subscriptions,
            max_attempts: max_attempts.max(1),
        }
    }

    /// The subscription the ledger would charge right now.
    pub async fn active_subscription(
        &self,
        user_id: &UserId,
        now: Timestamp,
    ) -> Result<Option<Subscription>, DomainError> {
        let subscriptions = self.load(user_id, now).await?;
        Ok(select_active(&subscriptions, now).cloned())
    }

    /// Spends one credit.
    ///
    /// Unlimited subscriptions succeed without a write.
    #[tracing::instrument(skip_all, fields(user_id = %user_id))]
    pub async fn deduct(&self, user_id: &UserId, now: Timestamp) -> Result<Charge, LedgerError> {
        for attempt in 1..=self.max_attempts {
            let subscriptions = self.load(user_id, now).await?;
            let Some(selected) = select_active(&subscriptions, now) else {
                return Err(LedgerError::NoActiveSubscription(user_id.clone()));
            };

            let mut subscription = selected.clone();
            let expected = subscription.version;
            let deduction = match subscription.deduct(now) {
                Ok(deduction) => deduction,
                Err(CreditError::Insufficient(_)) => {
                    return Err(LedgerError::InsufficientCredit(user_id.clone()))
                }
                Err(CreditError::Inactive(_)) => {
                    return Err(LedgerError::NoActiveSubscription(user_id.clone()))
                }
            };

            let charge = Charge {
                subscription_id: subscription.id,
                deduction,
            };
            if !charge.is_charged() {
                return Ok(charge);
            }

            if self
                .subscriptions
                .compare_and_set(&subscription, expected)
                .await?
            {
                tracing::debug!(
                    subscription_id = %subscription.id,
                    remaining = ?subscription.credits.remaining(),
                    "credit deducted"
                );
                return Ok(charge);
            }
            tracing::debug!(attempt, "credit deduction lost a race, retrying");
        }

        Err(LedgerError::Contention {
            user_id: user_id.clone(),
            attempts: self.max_attempts,
        })
    }

    /// Returns one credit. Never fails; see [`RefundOutcome::Failed`].
    #[tracing::instrument(skip_all, fields(user_id = %user_id))]
    pub async fn refund(&self, user_id: &UserId, now: Timestamp) -> RefundOutcome {
        match self.try_refund(user_id, now).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "credit refund failed");
                RefundOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn try_refund(&self, user_id: &UserId, now: Timestamp) -> Result<RefundOutcome, LedgerError> {
        for attempt in 1..=self.max_attempts {
            let subscriptions = self.load(user_id, now).await?;
            let Some(selected) = select_active(&subscriptions, now) else {
                let balance = self.subscriptions.add_fallback_credit(user_id, 1).await?;
                tracing::info!(user_id = %user_id, balance, "refund credited to fallback balance");
                return Ok(RefundOutcome::Fallback { balance });
            };

            let mut subscription = selected.clone();
            let expected = subscription.version;
            if !subscription.refund(now) {
                return Ok(RefundOutcome::Unmetered {
                    subscription_id: subscription.id,
                });
            }

            if self
                .subscriptions
                .compare_and_set(&subscription, expected)
                .await?
            {
                return Ok(RefundOutcome::Subscription {
                    subscription_id: subscription.id,
                    remaining: subscription.credits.remaining().unwrap_or_default(),
                });
            }
            tracing::debug!(attempt, "credit refund lost a race, retrying");
        }

        Err(LedgerError::Contention {
            user_id: user_id.clone(),
            attempts: self.max_attempts,
        })
    }

    /// Reads a user's subscriptions and persists any lazily-detected expiry.
    async fn load(&self, user_id: &UserId, now: Timestamp) -> Result<Vec<Subscription>, DomainError> {
        let mut subscriptions = self.subscriptions.find_for_user(user_id).await?;

        for subscription in subscriptions.iter_mut().filter(|s| s.is_lapsed(now)) {
            let expected = subscription.version;
            let mut expired = subscription.clone();
            if expired.expire(now).is_err() {
                continue;
            }
            match self.subscriptions.compare_and_set(&expired, expected).await {
                Ok(true) => *subscription = expired,
                Ok(false) => {}
                Err(e) => {
                    tracing::debug!(subscription_id = %subscription.id, error = %e, "could not persist expiry")
                }
            }
        }

        Ok(subscriptions)
    }
}
