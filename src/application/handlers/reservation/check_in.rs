//! CheckInHandler - Marks an attendee as arrived.

use crate::application::engine::EngineContext;
use crate::domain::booking::{Booking, ReservationError};
use crate::domain::foundation::BookingId;

const CHECK_IN_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone)]
pub struct CheckInCommand {
    pub booking_id: BookingId,
}

#[derive(Debug, Clone)]
pub struct CheckInResult {
    pub booking: Booking,
    /// False when the attendee was already checked in.
    pub changed: bool,
}

pub struct CheckInHandler {
    ctx: EngineContext,
}

impl CheckInHandler {
    pub fn new(ctx: EngineContext) -> Self {
        Self { ctx }
    }

    #[tracing::instrument(skip_all, fields(booking_id = %cmd.booking_id))]
    pub async fn handle(&self, cmd: CheckInCommand) -> Result<CheckInResult, ReservationError> {
        let booking = self.find(&cmd.booking_id).await?;
        let _guard = self.ctx.locks.acquire(booking.class_id).await;

        for attempt in 1..=CHECK_IN_ATTEMPTS {
            let mut booking = self.find(&cmd.booking_id).await?;
            let expected = booking.version;
            if !booking.check_in()? {
                return Ok(CheckInResult {
                    booking,
                    changed: false,
                });
            }
            if self.ctx.bookings.compare_and_set(&booking, expected).await? {
                tracing::info!(user_id = %booking.user_id, "checked in");
                return Ok(CheckInResult {
                    booking,
                    changed: true,
                });
            }
            tracing::debug!(attempt, "booking changed underneath check-in, retrying");
        }

        Err(ReservationError::infrastructure(format!(
            "booking {} kept changing during check-in",
            cmd.booking_id
        )))
    }

    async fn find(&self, id: &BookingId) -> Result<Booking, ReservationError> {
        self.ctx
            .bookings
            .find_by_id(id)
            .await?
            .ok_or(ReservationError::BookingNotFound(*id))
    }
}
