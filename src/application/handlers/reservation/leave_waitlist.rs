//! LeaveWaitlistHandler - Command handler for leaving a class waitlist.

use crate::application::engine::EngineContext;
use crate::domain::booking::ReservationError;
use crate::domain::foundation::WaitlistEntryId;
use crate::domain::waitlist::{PositionChange, WaitlistEntry};

/// Command to leave a waitlist.
#[derive(Debug, Clone)]
pub struct LeaveWaitlistCommand {
    pub entry_id: WaitlistEntryId,
}

#[derive(Debug, Clone)]
pub struct LeaveWaitlistResult {
    pub entry: WaitlistEntry,
    /// Entries behind the leaver that moved up.
    pub moved: Vec<PositionChange>,
}

pub struct LeaveWaitlistHandler {
    ctx: EngineContext,
}

impl LeaveWaitlistHandler {
    pub fn new(ctx: EngineContext) -> Self {
        Self { ctx }
    }

    #[tracing::instrument(skip_all, fields(entry_id = %cmd.entry_id))]
    pub async fn handle(
        &self,
        cmd: LeaveWaitlistCommand,
    ) -> Result<LeaveWaitlistResult, ReservationError> {
        let entry = self.find(&cmd.entry_id).await?;
        let class = self.ctx.load_class(&entry.class_id).await?;

        let _guard = self.ctx.locks.acquire(class.id).await;

        // The entry may have been promoted while we waited for the lock
        let entry = self.find(&cmd.entry_id).await?;
        let moved = self.ctx.queue.remove(&entry, &class).await?;
        tracing::info!(class_id = %class.id, user_id = %entry.user_id, "left waitlist");

        Ok(LeaveWaitlistResult { entry, moved })
    }

    async fn find(&self, id: &WaitlistEntryId) -> Result<WaitlistEntry, ReservationError> {
        self.ctx
            .waitlist
            .find_by_id(id)
            .await?
            .ok_or(ReservationError::WaitlistEntryNotFound(*id))
    }
}
