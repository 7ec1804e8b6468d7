//! GetClassAvailabilityHandler - Query handler for seat and waitlist counts.

use serde::Serialize;

use crate::application::engine::EngineContext;
use crate::domain::booking::ReservationError;
use crate::domain::foundation::{ClassId, Timestamp};

#[derive(Debug, Clone)]
pub struct GetClassAvailabilityQuery {
    pub class_id: ClassId,
}

/// Seat summary for a class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassAvailability {
    pub class_id: ClassId,
    pub capacity: u32,
    pub confirmed: u32,
    pub seats_left: u32,
    pub waitlist_length: u32,
    pub bookable: bool,
    /// A freed seat would still be offered to the waitlist.
    pub promotion_open: bool,
}

pub type GetClassAvailabilityResult = ClassAvailability;

pub struct GetClassAvailabilityHandler {
    ctx: EngineContext,
}

impl GetClassAvailabilityHandler {
    pub fn new(ctx: EngineContext) -> Self {
        Self { ctx }
    }

    pub async fn handle(
        &self,
        query: GetClassAvailabilityQuery,
    ) -> Result<GetClassAvailabilityResult, ReservationError> {
        let class = self.ctx.load_class(&query.class_id).await?;
        let confirmed = self.ctx.bookings.count_confirmed(&class.id).await?;
        let waitlist = self.ctx.waitlist.list_for_class(&class.id).await?;

        Ok(ClassAvailability {
            class_id: class.id,
            capacity: class.capacity,
            confirmed,
            seats_left: class.capacity.saturating_sub(confirmed),
            waitlist_length: u32::try_from(waitlist.len()).unwrap_or(u32::MAX),
            bookable: class.is_bookable(),
            promotion_open: class.is_bookable()
                && class.accepts_promotions(Timestamp::now(), self.ctx.lead_time),
        })
    }
}
