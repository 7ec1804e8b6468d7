//! Subscription repository port.
//!
//! Also owns the user-level fallback credit balance that receives refunds
//! when a user has no active subscription at refund time.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, UserId};
use crate::domain::subscription::Subscription;

/// Repository port for subscriptions and fallback balances.
///
/// Implementations must ensure:
/// - `compare_and_set` is atomic with respect to the version check
/// - `add_fallback_credit` is an atomic increment
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// All subscriptions of a user, in any status.
    async fn find_for_user(&self, user_id: &UserId) -> Result<Vec<Subscription>, DomainError>;

    /// Insert or replace a subscription unconditionally.
    async fn save(&self, subscription: &Subscription) -> Result<(), DomainError>;

    /// Store `subscription` only if the stored version equals `expected_version`.
    ///
    /// Returns false on a version mismatch.
    ///
    /// # Errors
    ///
    /// - `SubscriptionNotFound` if the row does not exist
    /// - `DatabaseError` on persistence failure
    async fn compare_and_set(
        &self,
        subscription: &Subscription,
        expected_version: i64,
    ) -> Result<bool, DomainError>;

    /// Add credits to the fallback balance and return the new balance.
    async fn add_fallback_credit(&self, user_id: &UserId, amount: u32) -> Result<u32, DomainError>;

    /// Current fallback balance; zero when the user has none.
    async fn fallback_balance(&self, user_id: &UserId) -> Result<u32, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscription_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn SubscriptionRepository) {}
    }
}
