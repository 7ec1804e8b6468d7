//! In-memory subscription repository.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode, SubscriptionId, UserId};
use crate::domain::subscription::Subscription;
use crate::ports::SubscriptionRepository;

/// In-memory storage for subscriptions and fallback balances.
#[derive(Debug, Clone, Default)]
pub struct InMemorySubscriptionRepository {
    subscriptions: Arc<RwLock<HashMap<SubscriptionId, Subscription>>>,
    fallback: Arc<RwLock<HashMap<UserId, u32>>>,
}

impl InMemorySubscriptionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn find_by_id(&self, id: &SubscriptionId) -> Option<Subscription> {
        self.subscriptions.read().await.get(id).cloned()
    }
}

#[async_trait]
impl SubscriptionRepository for InMemorySubscriptionRepository {
    async fn find_for_user(&self, user_id: &UserId) -> Result<Vec<Subscription>, DomainError> {
        let subscriptions = self.subscriptions.read().await;
        let mut found: Vec<Subscription> = subscriptions
            .values()
            .filter(|s| &s.user_id == user_id)
            .cloned()
            .collect();
        found.sort_by_key(|s| s.created_at);
        Ok(found)
    }

    async fn save(&self, subscription: &Subscription) -> Result<(), DomainError> {
        self.subscriptions
            .write()
            .await
            .insert(subscription.id, subscription.clone());
        Ok(())
    }

    async fn compare_and_set(
        &self,
        subscription: &Subscription,
        expected_version: i64,
    ) -> Result<bool, DomainError> {
        let mut subscriptions = self.subscriptions.write().await;
        let stored = subscriptions.get_mut(&subscription.id).ok_or_else(|| {
            DomainError::new(
                ErrorCode::SubscriptionNotFound,
                format!("Subscription not found: {}", subscription.id),
            )
        })?;

        if stored.version != expected_version {
            return Ok(false);
        }
        *stored = subscription.clone();
        Ok(true)
    }

    async fn add_fallback_credit(&self, user_id: &UserId, amount: u32) -> Result<u32, DomainError> {
        let mut fallback = self.fallback.write().await;
        let balance = fallback.entry(user_id.clone()).or_insert(0);
        *balance = balance.saturating_add(amount);
        Ok(*balance)
    }

    async fn fallback_balance(&self, user_id: &UserId) -> Result<u32, DomainError> {
        Ok(self.fallback.read().await.get(user_id).copied().unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::Timestamp;
    use crate::domain::studio::{Equipment, SubscriptionCategory};
    use crate::domain::subscription::CreditAllowance;

    fn subscription(user: &UserId) -> Subscription {
        Subscription::activate(
            SubscriptionId::new(),
            user.clone(),
            SubscriptionCategory::Group,
            Equipment::Both,
            CreditAllowance::Metered(3),
            Timestamp::now().add_days(28),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn compare_and_set_applies_matching_version() {
        let repo = InMemorySubscriptionRepository::new();
        let user = UserId::new("member-2").unwrap();
        let mut sub = subscription(&user);
        repo.save(&sub).await.unwrap();

        let expected = sub.version;
        sub.deduct(Timestamp::now()).unwrap();
        assert!(repo.compare_and_set(&sub, expected).await.unwrap());

        let stored = repo.find_by_id(&sub.id).await.unwrap();
        assert_eq!(stored.credits, CreditAllowance::Metered(2));
    }

    #[tokio::test]
    async fn compare_and_set_rejects_stale_write() {
        let repo = InMemorySubscriptionRepository::new();
        let user = UserId::new("member-2").unwrap();
        let original = subscription(&user);
        repo.save(&original).await.unwrap();

        let mut first = original.clone();
        first.deduct(Timestamp::now()).unwrap();
        assert!(repo.compare_and_set(&first, original.version).await.unwrap());

        let mut second = original.clone();
        second.deduct(Timestamp::now()).unwrap();
        assert!(!repo.compare_and_set(&second, original.version).await.unwrap());
    }

    #[tokio::test]
    async fn fallback_balance_accumulates() {
        let repo = InMemorySubscriptionRepository::new();
        let user = UserId::new("member-4").unwrap();
        assert_eq!(repo.fallback_balance(&user).await.unwrap(), 0);
        assert_eq!(repo.add_fallback_credit(&user, 1).await.unwrap(), 1);
        assert_eq!(repo.add_fallback_credit(&user, 1).await.unwrap(), 2);
        assert_eq!(repo.fallback_balance(&user).await.unwrap(), 2);
    }
}
