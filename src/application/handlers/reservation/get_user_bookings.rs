//! GetUserBookingsHandler - Query handler for a user's bookings.

use crate::application::engine::EngineContext;
use crate::domain::booking::{Booking, BookingStatus, ReservationError};
use crate::domain::foundation::UserId;

#[derive(Debug, Clone)]
pub struct GetUserBookingsQuery {
    pub user_id: UserId,
    /// Include cancelled rows.
    pub include_cancelled: bool,
}

/// Bookings newest first.
pub type GetUserBookingsResult = Vec<Booking>;

pub struct GetUserBookingsHandler {
    ctx: EngineContext,
}

impl GetUserBookingsHandler {
    pub fn new(ctx: EngineContext) -> Self {
        Self { ctx }
    }

    pub async fn handle(
        &self,
        query: GetUserBookingsQuery,
    ) -> Result<GetUserBookingsResult, ReservationError> {
        let bookings = self.ctx.bookings.list_for_user(&query.user_id).await?;
        Ok(bookings
            .into_iter()
            .filter(|b| query.include_cancelled || b.status != BookingStatus::Cancelled)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{user, Harness};
    use super::*;
    use crate::domain::booking::CancelledBy;
    use crate::ports::{BookingRepository, SeatClaim};

    #[tokio::test]
    async fn hides_cancelled_unless_asked() {
        let h = Harness::new();
        let yoga = h.class(5, 24).await;
        let barre = h.class(5, 48).await;
        h.bookings
            .confirm_if_room(&user("a"), &yoga.id, true, 5)
            .await
            .unwrap();
        let SeatClaim::Confirmed(mut dropped) = h
            .bookings
            .confirm_if_room(&user("a"), &barre.id, true, 5)
            .await
            .unwrap()
        else {
            panic!("expected a seat");
        };
        let expected = dropped.version;
        dropped.cancel(CancelledBy::User).unwrap();
        h.bookings.compare_and_set(&dropped, expected).await.unwrap();
        let handler = GetUserBookingsHandler::new(h.ctx.clone());

        let active = handler
            .handle(GetUserBookingsQuery {
                user_id: user("a"),
                include_cancelled: false,
            })
            .await
            .unwrap();
        let all = handler
            .handle(GetUserBookingsQuery {
                user_id: user("a"),
                include_cancelled: true,
            })
            .await
            .unwrap();

        assert_eq!(active.len(), 1);
        assert_eq!(active[0].class_id, yoga.id);
        assert_eq!(all.len(), 2);
    }
}
