//! Class repository port.
//!
//! The reservation engine never edits classes; `save` exists for the
//! scheduling side and for test fixtures.

use async_trait::async_trait;

use crate::domain::foundation::{ClassId, DomainError};
use crate::domain::studio::StudioClass;

/// Read access to scheduled classes.
#[async_trait]
pub trait ClassRepository: Send + Sync {
    /// Find a class by id.
    ///
    /// Returns `None` if not found.
    async fn find_by_id(&self, id: &ClassId) -> Result<Option<StudioClass>, DomainError>;

    /// Insert or replace a class.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` on persistence failure
    async fn save(&self, class: &StudioClass) -> Result<(), DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn ClassRepository) {}
    }
}
