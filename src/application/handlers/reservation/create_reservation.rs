//! CreateReservationHandler - Command handler for booking a class seat.

use crate::application::engine::{Capacity, EngineContext};
use crate::domain::booking::{Booking, ReservationError, ReservationEvent};
use crate::domain::eligibility::{self, Override};
use crate::domain::foundation::{ClassId, EventId, Timestamp, UserId};
use crate::domain::studio::StudioClass;
use crate::domain::waitlist::WaitlistEntry;
use crate::ports::SeatClaim;

/// Command to reserve a seat in a class.
#[derive(Debug, Clone)]
pub struct CreateReservationCommand {
    pub user_id: UserId,
    pub class_id: ClassId,
    /// Staff booking on behalf of the user; skips eligibility and charges nothing.
    pub override_: Override,
}

/// Where the user ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReservationOutcome {
    Confirmed {
        booking: Booking,
        /// The user already held this seat; nothing changed.
        already_held: bool,
        /// The class has no seats left after this request.
        class_full: bool,
    },
    Waitlisted { entry: WaitlistEntry },
}

impl ReservationOutcome {
    pub fn booking(&self) -> Option<&Booking> {
        match self {
            ReservationOutcome::Confirmed { booking, .. } => Some(booking),
            ReservationOutcome::Waitlisted { .. } => None,
        }
    }

    pub fn waitlist_position(&self) -> Option<u32> {
        match self {
            ReservationOutcome::Waitlisted { entry } => Some(entry.position),
            ReservationOutcome::Confirmed { .. } => None,
        }
    }
}

pub type CreateReservationResult = ReservationOutcome;

/// Handler for booking a class.
///
/// A full class is not an error: the user is appended to the waitlist and
/// told their position. Eligibility failures leave no trace; a failure
/// after the credit was taken gives the credit back.
pub struct CreateReservationHandler {
    ctx: EngineContext,
}

impl CreateReservationHandler {
    pub fn new(ctx: EngineContext) -> Self {
        Self { ctx }
    }

    #[tracing::instrument(
        skip_all,
        fields(class_id = %cmd.class_id, user_id = %cmd.user_id, staff = cmd.override_.is_active())
    )]
    pub async fn handle(
        &self,
        cmd: CreateReservationCommand,
    ) -> Result<CreateReservationResult, ReservationError> {
        let class = self.ctx.load_class(&cmd.class_id).await?;
        if !class.is_bookable() {
            return Err(ReservationError::ClassNotBookable(class.id));
        }

        let _guard = self.ctx.locks.acquire(class.id).await;
        let now = Timestamp::now();

        // 1. Re-requests return what the user already holds
        if let Some(outcome) = self.existing_reservation(&cmd.user_id, &class).await? {
            return Ok(outcome);
        }

        // 2. Eligibility
        let subscription = self.ctx.ledger.active_subscription(&cmd.user_id, now).await?;
        eligibility::check(&cmd.user_id, subscription.as_ref(), &class, now, cmd.override_)?;

        // 3. Capacity routing
        if let Capacity::Full { .. } = self.ctx.gatekeeper.check(&class).await? {
            let entry = self.ctx.queue.enqueue(&cmd.user_id, &class).await?;
            return Ok(ReservationOutcome::Waitlisted { entry });
        }

        // 4. Pay, then claim
        let funded = if cmd.override_.is_active() {
            false
        } else {
            self.ctx.ledger.deduct(&cmd.user_id, now).await?.is_charged()
        };

        let claim = match self.ctx.gatekeeper.claim(&cmd.user_id, &class, funded).await {
            Ok(claim) => claim,
            Err(e) => {
                self.ctx.refund_if_funded(funded, &cmd.user_id).await;
                return Err(e.into());
            }
        };

        match claim {
            SeatClaim::Confirmed(booking) => self.confirmed(booking, &class).await,
            SeatClaim::AlreadyConfirmed(booking) => {
                self.ctx.refund_if_funded(funded, &cmd.user_id).await;
                let class_full = self.ctx.gatekeeper.is_full(&class).await?;
                Ok(ReservationOutcome::Confirmed {
                    booking,
                    already_held: true,
                    class_full,
                })
            }
            SeatClaim::Full => {
                // Another process took the last seat between check and claim
                self.ctx.refund_if_funded(funded, &cmd.user_id).await;
                let entry = self.ctx.queue.enqueue(&cmd.user_id, &class).await?;
                Ok(ReservationOutcome::Waitlisted { entry })
            }
        }
    }

    async fn existing_reservation(
        &self,
        user_id: &UserId,
        class: &StudioClass,
    ) -> Result<Option<ReservationOutcome>, ReservationError> {
        if let Some(booking) = self
            .ctx
            .bookings
            .find_for_user_and_class(user_id, &class.id)
            .await?
            .filter(Booking::is_confirmed)
        {
            let class_full = self.ctx.gatekeeper.is_full(class).await?;
            return Ok(Some(ReservationOutcome::Confirmed {
                booking,
                already_held: true,
                class_full,
            }));
        }

        Ok(self
            .ctx
            .waitlist
            .find_for_user_and_class(user_id, &class.id)
            .await?
            .map(|entry| ReservationOutcome::Waitlisted { entry }))
    }

    async fn confirmed(
        &self,
        booking: Booking,
        class: &StudioClass,
    ) -> Result<ReservationOutcome, ReservationError> {
        tracing::info!(booking_id = %booking.id, funded = booking.funded, "seat confirmed");

        let display = class.display();
        self.ctx
            .notifier
            .emit(ReservationEvent::ClassBooked {
                event_id: EventId::new(),
                booking_id: booking.id,
                user_id: booking.user_id.clone(),
                class_id: class.id,
                display: display.clone(),
                occurred_at: Timestamp::now(),
            })
            .await;

        let class_full = self.ctx.gatekeeper.is_full(class).await?;
        if class_full {
            self.ctx
                .notifier
                .emit(ReservationEvent::ClassFull {
                    event_id: EventId::new(),
                    user_id: booking.user_id.clone(),
                    class_id: class.id,
                    capacity: class.capacity,
                    display,
                    occurred_at: Timestamp::now(),
                })
                .await;
        }

        Ok(ReservationOutcome::Confirmed {
            booking,
            already_held: false,
            class_full,
        })
    }
}
