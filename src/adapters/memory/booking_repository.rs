//! In-memory booking repository.
//!
//! Every mutating call takes the write lock for its whole duration, which
//! makes `confirm_if_room` atomic the same way a row-locking transaction
//! is in the Postgres adapter.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::booking::{Booking, BookingStatus};
use crate::domain::foundation::{BookingId, ClassId, DomainError, ErrorCode, UserId};
use crate::ports::{BookingRepository, SeatClaim};

/// In-memory storage for bookings.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBookingRepository {
    bookings: Arc<RwLock<HashMap<BookingId, Booking>>>,
}

impl InMemoryBookingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored rows in any status (for tests).
    pub async fn len(&self) -> usize {
        self.bookings.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.bookings.read().await.is_empty()
    }
}

fn pick_for_pair<'a>(
    bookings: impl Iterator<Item = &'a Booking>,
    user_id: &UserId,
    class_id: &ClassId,
) -> Option<&'a Booking> {
    bookings
        .filter(|b| &b.user_id == user_id && &b.class_id == class_id)
        .max_by_key(|b| (b.is_confirmed(), b.updated_at))
}

#[async_trait]
impl BookingRepository for InMemoryBookingRepository {
    async fn find_by_id(&self, id: &BookingId) -> Result<Option<Booking>, DomainError> {
        Ok(self.bookings.read().await.get(id).cloned())
    }

    async fn find_for_user_and_class(
        &self,
        user_id: &UserId,
        class_id: &ClassId,
    ) -> Result<Option<Booking>, DomainError> {
        let bookings = self.bookings.read().await;
        Ok(pick_for_pair(bookings.values(), user_id, class_id).cloned())
    }

    async fn count_confirmed(&self, class_id: &ClassId) -> Result<u32, DomainError> {
        let bookings = self.bookings.read().await;
        let count = bookings
            .values()
            .filter(|b| &b.class_id == class_id && b.is_confirmed())
            .count();
        Ok(count as u32)
    }

    async fn list_for_class(&self, class_id: &ClassId) -> Result<Vec<Booking>, DomainError> {
        let bookings = self.bookings.read().await;
        let mut found: Vec<Booking> = bookings
            .values()
            .filter(|b| &b.class_id == class_id)
            .cloned()
            .collect();
        found.sort_by_key(|b| b.created_at);
        Ok(found)
    }

    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Booking>, DomainError> {
        let bookings = self.bookings.read().await;
        let mut found: Vec<Booking> = bookings
            .values()
            .filter(|b| &b.user_id == user_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn confirm_if_room(
        &self,
        user_id: &UserId,
        class_id: &ClassId,
        funded: bool,
        capacity: u32,
    ) -> Result<SeatClaim, DomainError> {
        let mut bookings = self.bookings.write().await;

        let existing = pick_for_pair(bookings.values(), user_id, class_id).cloned();
        if let Some(booking) = existing.as_ref().filter(|b| b.is_confirmed()) {
            return Ok(SeatClaim::AlreadyConfirmed(booking.clone()));
        }

        let confirmed = bookings
            .values()
            .filter(|b| &b.class_id == class_id && b.is_confirmed())
            .count() as u32;
        if confirmed >= capacity {
            return Ok(SeatClaim::Full);
        }

        let booking = match existing.filter(|b| b.status == BookingStatus::Cancelled) {
            Some(mut reused) => {
                reused.reconfirm(funded)?;
                reused
            }
            None => Booking::confirm(BookingId::new(), user_id.clone(), *class_id, funded),
        };

        bookings.insert(booking.id, booking.clone());
        Ok(SeatClaim::Confirmed(booking))
    }

    async fn compare_and_set(
        &self,
        booking: &Booking,
        expected_version: i64,
    ) -> Result<bool, DomainError> {
        let mut bookings = self.bookings.write().await;
        let stored = bookings.get_mut(&booking.id).ok_or_else(|| {
            DomainError::new(
                ErrorCode::BookingNotFound,
                format!("Booking not found: {}", booking.id),
            )
        })?;

        if stored.version != expected_version {
            return Ok(false);
        }
        *stored = booking.clone();
        Ok(true)
    }

    async fn delete(&self, id: &BookingId) -> Result<bool, DomainError> {
        Ok(self.bookings.write().await.remove(id).is_some())
    }
}
