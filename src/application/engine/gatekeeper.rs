//! Capacity gatekeeper.
//!
//! `check` routes a request to confirmation or the waitlist; `claim` is
//! the store's atomic count-and-insert and is the step that actually
//! guarantees capacity. Callers hold the class lock across both.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, UserId};
use crate::domain::studio::StudioClass;
use crate::ports::{BookingRepository, SeatClaim};

/// Seat availability at the time of the check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capacity {
    HasRoom { confirmed: u32, capacity: u32 },
    Full { capacity: u32 },
}

impl Capacity {
    pub fn has_room(&self) -> bool {
        matches!(self, Capacity::HasRoom { .. })
    }
}

#[derive(Clone)]
pub struct CapacityGatekeeper {
    bookings: Arc<dyn BookingRepository>,
}

impl CapacityGatekeeper {
    pub fn new(bookings: Arc<dyn BookingRepository>) -> Self {
        Self { bookings }
    }

    pub async fn check(&self, class: &StudioClass) -> Result<Capacity, DomainError> {
        let confirmed = self.bookings.count_confirmed(&class.id).await?;
        if confirmed >= class.capacity {
            Ok(Capacity::Full {
                capacity: class.capacity,
            })
        } else {
            Ok(Capacity::HasRoom {
                confirmed,
                capacity: class.capacity,
            })
        }
    }

    /// Confirms a seat if one is still free. Fails closed.
    pub async fn claim(
        &self,
        user_id: &UserId,
        class: &StudioClass,
        funded: bool,
    ) -> Result<SeatClaim, DomainError> {
        self.bookings
            .confirm_if_room(user_id, &class.id, funded, class.capacity)
            .await
    }

    pub async fn is_full(&self, class: &StudioClass) -> Result<bool, DomainError> {
        Ok(!self.check(class).await?.has_room())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryBookingRepository;
    use crate::domain::foundation::{ClassId, InstructorId, Timestamp};
    use crate::domain::studio::{ClassCategory, Equipment};

    fn class(capacity: u32) -> StudioClass {
        StudioClass::schedule(
            ClassId::new(),
            "Spin",
            Timestamp::now().add_days(1),
            45,
            capacity,
            ClassCategory::Group,
            Equipment::Mat,
            InstructorId::new(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn routes_to_full_at_capacity() {
        let gatekeeper = CapacityGatekeeper::new(Arc::new(InMemoryBookingRepository::new()));
        let class = class(2);

        assert_eq!(
            gatekeeper.check(&class).await.unwrap(),
            Capacity::HasRoom {
                confirmed: 0,
                capacity: 2
            }
        );

        for name in ["a", "b"] {
            let claim = gatekeeper
                .claim(&UserId::new(name).unwrap(), &class, true)
                .await
                .unwrap();
            assert!(matches!(claim, SeatClaim::Confirmed(_)));
        }

        assert_eq!(
            gatekeeper.check(&class).await.unwrap(),
            Capacity::Full { capacity: 2 }
        );
        assert!(gatekeeper.is_full(&class).await.unwrap());
    }

    #[tokio::test]
    async fn claim_fails_closed_when_full() {
        let gatekeeper = CapacityGatekeeper::new(Arc::new(InMemoryBookingRepository::new()));
        let class = class(1);
        gatekeeper
            .claim(&UserId::new("a").unwrap(), &class, false)
            .await
            .unwrap();

        let claim = gatekeeper
            .claim(&UserId::new("b").unwrap(), &class, false)
            .await
            .unwrap();
        assert_eq!(claim, SeatClaim::Full);
    }
}
