//! Reservation manager facade.
//!
//! Bundles every reservation handler over one [`EngineContext`] so callers
//! get a single entry point and all operations share the same class locks.

use crate::config::BookingRules;
use crate::domain::booking::{Booking, CancelledBy, ReservationError};
use crate::domain::eligibility::Override;
use crate::domain::foundation::{BookingId, ClassId, UserId, WaitlistEntryId};
use crate::domain::waitlist::WaitlistEntry;

use super::engine::{EngineContext, ReservationPorts};
use super::handlers::*;

pub struct ReservationManager {
    create: CreateReservationHandler,
    cancel: CancelReservationHandler,
    remove: RemoveReservationHandler,
    leave: LeaveWaitlistHandler,
    check_in: CheckInHandler,
    availability: GetClassAvailabilityHandler,
    waitlist: GetWaitlistHandler,
    user_bookings: GetUserBookingsHandler,
}

impl ReservationManager {
    pub fn new(ports: ReservationPorts, rules: &BookingRules) -> Self {
        Self::from_context(EngineContext::new(ports, rules))
    }

    pub fn from_context(ctx: EngineContext) -> Self {
        Self {
            create: CreateReservationHandler::new(ctx.clone()),
            cancel: CancelReservationHandler::new(ctx.clone()),
            remove: RemoveReservationHandler::new(ctx.clone()),
            leave: LeaveWaitlistHandler::new(ctx.clone()),
            check_in: CheckInHandler::new(ctx.clone()),
            availability: GetClassAvailabilityHandler::new(ctx.clone()),
            waitlist: GetWaitlistHandler::new(ctx.clone()),
            user_bookings: GetUserBookingsHandler::new(ctx),
        }
    }

    pub async fn create_reservation(
        &self,
        user_id: UserId,
        class_id: ClassId,
        override_: Override,
    ) -> Result<ReservationOutcome, ReservationError> {
        self.create
            .handle(CreateReservationCommand {
                user_id,
                class_id,
                override_,
            })
            .await
    }

    pub async fn cancel_reservation(
        &self,
        booking_id: BookingId,
        cancelled_by: CancelledBy,
    ) -> Result<CancelReservationResult, ReservationError> {
        self.cancel
            .handle(CancelReservationCommand {
                booking_id,
                cancelled_by,
            })
            .await
    }

    pub async fn remove_reservation(
        &self,
        booking_id: BookingId,
        removed_by: CancelledBy,
    ) -> Result<RemoveReservationResult, ReservationError> {
        self.remove
            .handle(RemoveReservationCommand {
                booking_id,
                removed_by,
            })
            .await
    }

    pub async fn leave_waitlist(
        &self,
        entry_id: WaitlistEntryId,
    ) -> Result<LeaveWaitlistResult, ReservationError> {
        self.leave.handle(LeaveWaitlistCommand { entry_id }).await
    }

    pub async fn check_in(&self, booking_id: BookingId) -> Result<CheckInResult, ReservationError> {
        self.check_in.handle(CheckInCommand { booking_id }).await
    }

    pub async fn class_availability(
        &self,
        class_id: ClassId,
    ) -> Result<ClassAvailability, ReservationError> {
        self.availability
            .handle(GetClassAvailabilityQuery { class_id })
            .await
    }

    pub async fn waitlist(&self, class_id: ClassId) -> Result<Vec<WaitlistEntry>, ReservationError> {
        self.waitlist.handle(GetWaitlistQuery { class_id }).await
    }

    pub async fn user_bookings(
        &self,
        user_id: UserId,
        include_cancelled: bool,
    ) -> Result<Vec<Booking>, ReservationError> {
        self.user_bookings
            .handle(GetUserBookingsQuery {
                user_id,
                include_cancelled,
            })
            .await
    }
}
