//! GetWaitlistHandler - Query handler for a class's ordered waitlist.

use crate::application::engine::EngineContext;
use crate::domain::booking::ReservationError;
use crate::domain::foundation::ClassId;
use crate::domain::waitlist::WaitlistEntry;

#[derive(Debug, Clone)]
pub struct GetWaitlistQuery {
    pub class_id: ClassId,
}

/// Entries in position order, head first.
pub type GetWaitlistResult = Vec<WaitlistEntry>;

pub struct GetWaitlistHandler {
    ctx: EngineContext,
}

impl GetWaitlistHandler {
    pub fn new(ctx: EngineContext) -> Self {
        Self { ctx }
    }

    pub async fn handle(&self, query: GetWaitlistQuery) -> Result<GetWaitlistResult, ReservationError> {
        let class = self.ctx.load_class(&query.class_id).await?;
        self.ctx.queue.entries(&class).await
    }
}
