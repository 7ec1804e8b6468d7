//! In-memory waitlist repository.
//!
//! Enforces the same uniqueness rules as the `waitlist` table: one entry
//! per (user, class) and one per (class, position).

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{ClassId, DomainError, ErrorCode, UserId, WaitlistEntryId};
use crate::domain::waitlist::WaitlistEntry;
use crate::ports::WaitlistRepository;

/// In-memory storage for waitlist entries.
#[derive(Debug, Clone, Default)]
pub struct InMemoryWaitlistRepository {
    entries: Arc<RwLock<HashMap<WaitlistEntryId, WaitlistEntry>>>,
}

impl InMemoryWaitlistRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn position_taken(class_id: &ClassId, position: u32) -> DomainError {
    DomainError::new(
        ErrorCode::WaitlistPositionTaken,
        format!("Position {} already taken for class {}", position, class_id),
    )
}

#[async_trait]
impl WaitlistRepository for InMemoryWaitlistRepository {
    async fn find_by_id(&self, id: &WaitlistEntryId) -> Result<Option<WaitlistEntry>, DomainError> {
        Ok(self.entries.read().await.get(id).cloned())
    }

    async fn find_for_user_and_class(
        &self,
        user_id: &UserId,
        class_id: &ClassId,
    ) -> Result<Option<WaitlistEntry>, DomainError> {
        let entries = self.entries.read().await;
        Ok(entries
            .values()
            .find(|e| &e.user_id == user_id && &e.class_id == class_id)
            .cloned())
    }

    async fn list_for_class(&self, class_id: &ClassId) -> Result<Vec<WaitlistEntry>, DomainError> {
        let entries = self.entries.read().await;
        let mut found: Vec<WaitlistEntry> = entries
            .values()
            .filter(|e| &e.class_id == class_id)
            .cloned()
            .collect();
        found.sort_by_key(|e| e.position);
        Ok(found)
    }

    async fn max_position(&self, class_id: &ClassId) -> Result<Option<u32>, DomainError> {
        let entries = self.entries.read().await;
        Ok(entries
            .values()
            .filter(|e| &e.class_id == class_id)
            .map(|e| e.position)
            .max())
    }

    async fn insert(&self, entry: &WaitlistEntry) -> Result<(), DomainError> {
        let mut entries = self.entries.write().await;

        for existing in entries.values().filter(|e| e.class_id == entry.class_id) {
            if existing.user_id == entry.user_id {
                return Err(DomainError::new(
                    ErrorCode::DuplicateWaitlistEntry,
                    format!(
                        "User {} already waitlisted for class {}",
                        entry.user_id, entry.class_id
                    ),
                ));
            }
            if existing.position == entry.position {
                return Err(position_taken(&entry.class_id, entry.position));
            }
        }

        entries.insert(entry.id, entry.clone());
        Ok(())
    }

    async fn delete(&self, id: &WaitlistEntryId) -> Result<bool, DomainError> {
        Ok(self.entries.write().await.remove(id).is_some())
    }

    async fn update_position(&self, id: &WaitlistEntryId, position: u32) -> Result<(), DomainError> {
        let mut entries = self.entries.write().await;

        let class_id = entries
            .get(id)
            .map(|e| e.class_id)
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::WaitlistEntryNotFound,
                    format!("Waitlist entry not found: {}", id),
                )
            })?;

        let collides = entries
            .values()
            .any(|e| e.class_id == class_id && e.position == position && &e.id != id);
        if collides {
            return Err(position_taken(&class_id, position));
        }

        if let Some(entry) = entries.get_mut(id) {
            entry.position = position;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(user: &str, class_id: ClassId, position: u32) -> WaitlistEntry {
        WaitlistEntry::enqueue(
            WaitlistEntryId::new(),
            UserId::new(user).unwrap(),
            class_id,
            position,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_user() {
        let repo = InMemoryWaitlistRepository::new();
        let class = ClassId::new();
        repo.insert(&entry("a", class, 1)).await.unwrap();

        let err = repo.insert(&entry("a", class, 2)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::DuplicateWaitlistEntry);
    }

    #[tokio::test]
    async fn insert_rejects_taken_position() {
        let repo = InMemoryWaitlistRepository::new();
        let class = ClassId::new();
        repo.insert(&entry("a", class, 1)).await.unwrap();

        let err = repo.insert(&entry("b", class, 1)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::WaitlistPositionTaken);
    }

    #[tokio::test]
    async fn positions_are_scoped_per_class() {
        let repo = InMemoryWaitlistRepository::new();
        repo.insert(&entry("a", ClassId::new(), 1)).await.unwrap();
        repo.insert(&entry("a", ClassId::new(), 1)).await.unwrap();
    }

    #[tokio::test]
    async fn list_is_ordered_by_position() {
        let repo = InMemoryWaitlistRepository::new();
        let class = ClassId::new();
        repo.insert(&entry("c", class, 3)).await.unwrap();
        repo.insert(&entry("a", class, 1)).await.unwrap();
        repo.insert(&entry("b", class, 2)).await.unwrap();

        let users: Vec<String> = repo
            .list_for_class(&class)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.user_id.to_string())
            .collect();
        assert_eq!(users, vec!["a", "b", "c"]);
        assert_eq!(repo.max_position(&class).await.unwrap(), Some(3));
    }

    #[tokio::test]
    async fn update_position_refuses_collision() {
        let repo = InMemoryWaitlistRepository::new();
        let class = ClassId::new();
        let first = entry("a", class, 1);
        let second = entry("b", class, 2);
        repo.insert(&first).await.unwrap();
        repo.insert(&second).await.unwrap();

        let err = repo.update_position(&second.id, 1).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::WaitlistPositionTaken);

        repo.delete(&first.id).await.unwrap();
        repo.update_position(&second.id, 1).await.unwrap();
        let moved = repo.find_by_id(&second.id).await.unwrap().unwrap();
        assert_eq!(moved.position, 1);
    }

    #[tokio::test]
    async fn update_position_of_missing_entry_is_not_found() {
        let repo = InMemoryWaitlistRepository::new();
        let err = repo
            .update_position(&WaitlistEntryId::new(), 1)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::WaitlistEntryNotFound);
    }
}
