//! RemoveReservationHandler - Staff hard delete of a booking.

use crate::application::engine::{CascadeReport, EngineContext, RefundOutcome};
use crate::domain::booking::{Booking, BookingStatus, CancelledBy, ReservationError, ReservationEvent};
use crate::domain::foundation::{BookingId, EventId, Timestamp};

use super::cancel_reservation::run_cascade;

/// Command to delete a booking outright.
#[derive(Debug, Clone)]
pub struct RemoveReservationCommand {
    pub booking_id: BookingId,
    pub removed_by: CancelledBy,
}

#[derive(Debug, Clone)]
pub struct RemoveReservationResult {
    /// The row as it was before deletion.
    pub booking: Booking,
    pub refund: Option<RefundOutcome>,
    pub cascade: Option<CascadeReport>,
}

/// Handler for removing bookings.
///
/// Unlike a cancellation the row is deleted and the credit is returned
/// whether or not the booking was funded. A row that was already
/// cancelled had its seat and credit settled then; it is only deleted.
pub struct RemoveReservationHandler {
    ctx: EngineContext,
}

impl RemoveReservationHandler {
    pub fn new(ctx: EngineContext) -> Self {
        Self { ctx }
    }

    #[tracing::instrument(skip_all, fields(booking_id = %cmd.booking_id, removed_by = %cmd.removed_by))]
    pub async fn handle(
        &self,
        cmd: RemoveReservationCommand,
    ) -> Result<RemoveReservationResult, ReservationError> {
        let booking = self.find(&cmd.booking_id).await?;
        let class = self.ctx.load_class(&booking.class_id).await?;

        let _guard = self.ctx.locks.acquire(class.id).await;

        let booking = self.find(&cmd.booking_id).await?;
        if !self.ctx.bookings.delete(&booking.id).await? {
            return Err(ReservationError::BookingNotFound(booking.id));
        }
        tracing::info!(class_id = %class.id, user_id = %booking.user_id, status = %booking.status, "booking removed");

        if booking.status == BookingStatus::Cancelled {
            return Ok(RemoveReservationResult {
                booking,
                refund: None,
                cascade: None,
            });
        }

        // Removal refunds regardless of the funded flag
        let refund = Some(self.ctx.ledger.refund(&booking.user_id, Timestamp::now()).await);

        self.ctx
            .notifier
            .emit(ReservationEvent::ClassCancelled {
                event_id: EventId::new(),
                booking_id: booking.id,
                user_id: booking.user_id.clone(),
                class_id: class.id,
                cancelled_by: cmd.removed_by,
                display: class.display(),
                occurred_at: Timestamp::now(),
            })
            .await;

        let cascade = if booking.is_confirmed() {
            run_cascade(&self.ctx, &class).await
        } else {
            None
        };

        Ok(RemoveReservationResult {
            booking,
            refund,
            cascade,
        })
    }

    async fn find(&self, id: &BookingId) -> Result<Booking, ReservationError> {
        self.ctx
            .bookings
            .find_by_id(id)
            .await?
            .ok_or(ReservationError::BookingNotFound(*id))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{user, Harness};
    use super::*;
    use crate::application::engine::PromotionOutcome;
    use crate::domain::studio::StudioClass;
    use crate::domain::subscription::CreditAllowance;
    use crate::ports::{BookingRepository, SeatClaim};

    async fn book(h: &Harness, class: &StudioClass, name: &str, funded: bool) -> Booking {
        match h
            .bookings
            .confirm_if_room(&user(name), &class.id, funded, class.capacity)
            .await
            .unwrap()
        {
            SeatClaim::Confirmed(b) => b,
            other => panic!("expected seat, got {:?}", other),
        }
    }

    fn remove(booking: &Booking) -> RemoveReservationCommand {
        RemoveReservationCommand {
            booking_id: booking.id,
            removed_by: CancelledBy::Reception,
        }
    }

    #[tokio::test]
    async fn removal_refunds_even_unfunded_booking() {
        let h = Harness::new();
        let class = h.class(5, 24).await;
        h.subscribe("a", CreditAllowance::Metered(2)).await;
        let booking = book(&h, &class, "a", false).await;
        let handler = RemoveReservationHandler::new(h.ctx.clone());

        let result = handler.handle(remove(&booking)).await.unwrap();

        assert!(result.refund.is_some());
        assert_eq!(h.credits("a").await, Some(3));
        assert!(h.bookings.find_by_id(&booking.id).await.unwrap().is_none());
        assert!(h.bus.has_event("class_cancelled"));
    }

    #[tokio::test]
    async fn removal_without_subscription_credits_fallback_balance() {
        let h = Harness::new();
        let class = h.class(5, 24).await;
        let booking = book(&h, &class, "walk-in", false).await;
        let handler = RemoveReservationHandler::new(h.ctx.clone());

        let result = handler.handle(remove(&booking)).await.unwrap();
        assert_eq!(result.refund, Some(RefundOutcome::Fallback { balance: 1 }));
    }

    #[tokio::test]
    async fn removal_frees_seat_for_waitlist() {
        let h = Harness::new();
        let class = h.class(1, 24).await;
        h.subscribe("b", CreditAllowance::Metered(1)).await;
        let booking = book(&h, &class, "a", true).await;
        h.ctx.queue.enqueue(&user("b"), &class).await.unwrap();
        let handler = RemoveReservationHandler::new(h.ctx.clone());

        let result = handler.handle(remove(&booking)).await.unwrap();
        assert!(matches!(
            result.cascade.unwrap().outcome,
            PromotionOutcome::Promoted { .. }
        ));
    }

    #[tokio::test]
    async fn removing_cancelled_row_only_deletes() {
        let h = Harness::new();
        let class = h.class(5, 24).await;
        h.subscribe("a", CreditAllowance::Metered(2)).await;
        let mut booking = book(&h, &class, "a", true).await;
        let expected = booking.version;
        booking.cancel(CancelledBy::User).unwrap();
        h.bookings.compare_and_set(&booking, expected).await.unwrap();
        let handler = RemoveReservationHandler::new(h.ctx.clone());

        let result = handler.handle(remove(&booking)).await.unwrap();

        assert!(result.refund.is_none());
        assert_eq!(h.credits("a").await, Some(2));
        assert!(h.bookings.is_empty().await);
        assert_eq!(h.bus.event_count(), 0);
    }
}
