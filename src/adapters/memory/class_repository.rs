//! In-memory class repository.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{ClassId, DomainError};
use crate::domain::studio::StudioClass;
use crate::ports::ClassRepository;

/// In-memory storage for scheduled classes.
#[derive(Debug, Clone, Default)]
pub struct InMemoryClassRepository {
    classes: Arc<RwLock<HashMap<ClassId, StudioClass>>>,
}

impl InMemoryClassRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ClassRepository for InMemoryClassRepository {
    async fn find_by_id(&self, id: &ClassId) -> Result<Option<StudioClass>, DomainError> {
        Ok(self.classes.read().await.get(id).cloned())
    }

    async fn save(&self, class: &StudioClass) -> Result<(), DomainError> {
        self.classes.write().await.insert(class.id, class.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{InstructorId, Timestamp};
    use crate::domain::studio::{ClassCategory, Equipment};

    #[tokio::test]
    async fn save_then_find() {
        let repo = InMemoryClassRepository::new();
        let class = StudioClass::schedule(
            ClassId::new(),
            "Barre",
            Timestamp::now().add_days(1),
            45,
            12,
            ClassCategory::Group,
            Equipment::Mat,
            InstructorId::new(),
        )
        .unwrap();

        repo.save(&class).await.unwrap();
        assert_eq!(repo.find_by_id(&class.id).await.unwrap(), Some(class));
        assert!(repo.find_by_id(&ClassId::new()).await.unwrap().is_none());
    }
}
