//! CancelReservationHandler - Command handler for releasing a seat.

use crate::application::engine::{CascadeReport, EngineContext, RefundOutcome};
use crate::domain::booking::{Booking, BookingStatus, CancelledBy, ReservationError, ReservationEvent};
use crate::domain::foundation::{BookingId, EventId, Timestamp};
use crate::domain::studio::StudioClass;

/// Conditional status updates retried before giving up.
const CANCEL_ATTEMPTS: u32 = 3;

/// Command to cancel a booking.
#[derive(Debug, Clone)]
pub struct CancelReservationCommand {
    pub booking_id: BookingId,
    pub cancelled_by: CancelledBy,
}

/// Result of a cancellation.
#[derive(Debug, Clone)]
pub struct CancelReservationResult {
    pub booking: Booking,
    /// Booking was already cancelled; nothing was done.
    pub already_cancelled: bool,
    /// Present when the booking had been paid for with a credit.
    pub refund: Option<RefundOutcome>,
    /// `None` when no cascade ran or it failed (failures are logged).
    pub cascade: Option<CascadeReport>,
}

/// Handler for cancelling bookings.
///
/// The status change always sticks once applied. Refund, notification and
/// promotion failures after it are logged and never undo the cancellation.
pub struct CancelReservationHandler {
    ctx: EngineContext,
}

impl CancelReservationHandler {
    pub fn new(ctx: EngineContext) -> Self {
        Self { ctx }
    }

    #[tracing::instrument(skip_all, fields(booking_id = %cmd.booking_id, cancelled_by = %cmd.cancelled_by))]
    pub async fn handle(
        &self,
        cmd: CancelReservationCommand,
    ) -> Result<CancelReservationResult, ReservationError> {
        let booking = self.find(&cmd.booking_id).await?;
        let class = self.ctx.load_class(&booking.class_id).await?;

        let _guard = self.ctx.locks.acquire(class.id).await;

        let Some(booking) = self.mark_cancelled(&cmd).await? else {
            let booking = self.find(&cmd.booking_id).await?;
            return Ok(CancelReservationResult {
                booking,
                already_cancelled: true,
                refund: None,
                cascade: None,
            });
        };
        tracing::info!(class_id = %class.id, user_id = %booking.user_id, "booking cancelled");

        let refund = self
            .ctx
            .refund_if_funded(booking.funded, &booking.user_id)
            .await;

        self.ctx
            .notifier
            .emit(ReservationEvent::ClassCancelled {
                event_id: EventId::new(),
                booking_id: booking.id,
                user_id: booking.user_id.clone(),
                class_id: class.id,
                cancelled_by: cmd.cancelled_by,
                display: class.display(),
                occurred_at: Timestamp::now(),
            })
            .await;

        let cascade = run_cascade(&self.ctx, &class).await;

        Ok(CancelReservationResult {
            booking,
            already_cancelled: false,
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

    /// Applies the status change; `None` if the booking was already cancelled.
    async fn mark_cancelled(
        &self,
        cmd: &CancelReservationCommand,
    ) -> Result<Option<Booking>, ReservationError> {
        for attempt in 1..=CANCEL_ATTEMPTS {
            let mut booking = self.find(&cmd.booking_id).await?;
            match booking.status {
                BookingStatus::Cancelled => return Ok(None),
                BookingStatus::Confirmed => {}
                status => {
                    return Err(ReservationError::InvalidState(format!(
                        "cannot cancel a {} booking",
                        status
                    )))
                }
            }

            let expected = booking.version;
            booking.cancel(cmd.cancelled_by)?;
            if self.ctx.bookings.compare_and_set(&booking, expected).await? {
                return Ok(Some(booking));
            }
            tracing::debug!(attempt, "booking changed underneath cancellation, retrying");
        }

        Err(ReservationError::infrastructure(format!(
            "booking {} kept changing during cancellation",
            cmd.booking_id
        )))
    }
}

/// Offers the freed seat to the waitlist, logging instead of failing.
pub(super) async fn run_cascade(ctx: &EngineContext, class: &StudioClass) -> Option<CascadeReport> {
    match ctx.cascade.run(class, Timestamp::now()).await {
        Ok(report) => Some(report),
        Err(e) => {
            tracing::warn!(class_id = %class.id, error = %e, "promotion cascade failed");
            None
        }
    }
}
