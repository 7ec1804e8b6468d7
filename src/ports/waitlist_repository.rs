//! Waitlist repository port.
//!
//! Stores enforce two uniqueness rules: one entry per (user, class) and
//! one entry per (class, position). Violations are reported through the
//! error code so callers can tell a duplicate user from a lost race for
//! a position.

use async_trait::async_trait;

use crate::domain::foundation::{ClassId, DomainError, UserId, WaitlistEntryId};
use crate::domain::waitlist::WaitlistEntry;

#[async_trait]
pub trait WaitlistRepository: Send + Sync {
    async fn find_by_id(&self, id: &WaitlistEntryId) -> Result<Option<WaitlistEntry>, DomainError>;

    async fn find_for_user_and_class(
        &self,
        user_id: &UserId,
        class_id: &ClassId,
    ) -> Result<Option<WaitlistEntry>, DomainError>;

    /// Entries of a class ordered by ascending position.
    async fn list_for_class(&self, class_id: &ClassId) -> Result<Vec<WaitlistEntry>, DomainError>;

    /// Highest occupied position, or `None` for an empty waitlist.
    async fn max_position(&self, class_id: &ClassId) -> Result<Option<u32>, DomainError>;

    /// Insert a new entry.
    ///
    /// # Errors
    ///
    /// - `DuplicateWaitlistEntry` if the user is already queued for the class
    /// - `WaitlistPositionTaken` if another entry holds the position
    /// - `DatabaseError` on persistence failure
    async fn insert(&self, entry: &WaitlistEntry) -> Result<(), DomainError>;

    /// Delete an entry. Returns false if it was already gone.
    async fn delete(&self, id: &WaitlistEntryId) -> Result<bool, DomainError>;

    /// Move an entry to a new position.
    ///
    /// # Errors
    ///
    /// - `WaitlistEntryNotFound` if the entry no longer exists
    /// - `WaitlistPositionTaken` if another entry holds the position
    async fn update_position(&self, id: &WaitlistEntryId, position: u32) -> Result<(), DomainError>;
}
