//! Wiring of engine components over a set of ports.

use chrono::Duration;
use std::sync::Arc;

use crate::config::BookingRules;
use crate::domain::booking::ReservationError;
use crate::domain::foundation::{ClassId, Timestamp, UserId};
use crate::domain::studio::StudioClass;
use crate::ports::{
    BookingRepository, ClassRepository, EventPublisher, SubscriptionRepository,
    WaitlistRepository,
};

use super::{
    CapacityGatekeeper, ClassLocks, CreditLedger, Notifier, PromotionCascade, RefundOutcome,
    WaitlistQueue,
};

/// Outbound ports the engine runs against.
#[derive(Clone)]
pub struct ReservationPorts {
    pub classes: Arc<dyn ClassRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub waitlist: Arc<dyn WaitlistRepository>,
    pub subscriptions: Arc<dyn SubscriptionRepository>,
    pub publisher: Arc<dyn EventPublisher>,
}

/// Engine components shared by every reservation handler.
///
/// Cloning is cheap and clones share the same [`ClassLocks`], so all
/// handlers built from one context serialize on the same classes.
#[derive(Clone)]
pub struct EngineContext {
    pub classes: Arc<dyn ClassRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub waitlist: Arc<dyn WaitlistRepository>,
    pub locks: ClassLocks,
    pub ledger: CreditLedger,
    pub gatekeeper: CapacityGatekeeper,
    pub queue: WaitlistQueue,
    pub cascade: PromotionCascade,
    pub notifier: Notifier,
    pub lead_time: Duration,
}

impl EngineContext {
    pub fn new(ports: ReservationPorts, rules: &BookingRules) -> Self {
        let lead_time = rules.promotion_lead_time();
        let notifier = Notifier::new(ports.publisher);
        let ledger = CreditLedger::new(ports.subscriptions, rules.credit_update_attempts);
        let gatekeeper = CapacityGatekeeper::new(ports.bookings.clone());
        let queue = WaitlistQueue::new(
            ports.waitlist.clone(),
            ports.bookings.clone(),
            notifier.clone(),
            rules.waitlist_insert_attempts,
        );
        let cascade = PromotionCascade::new(
            lead_time,
            ports.bookings.clone(),
            ledger.clone(),
            gatekeeper.clone(),
            queue.clone(),
            notifier.clone(),
        );

        Self {
            classes: ports.classes,
            bookings: ports.bookings,
            waitlist: ports.waitlist,
            locks: ClassLocks::new(),
            ledger,
            gatekeeper,
            queue,
            cascade,
            notifier,
            lead_time,
        }
    }

    pub async fn load_class(&self, class_id: &ClassId) -> Result<StudioClass, ReservationError> {
        self.classes
            .find_by_id(class_id)
            .await?
            .ok_or(ReservationError::ClassNotFound(*class_id))
    }

    /// Refunds one credit when `funded`; `None` otherwise.
    pub async fn refund_if_funded(
        &self,
        funded: bool,
        user_id: &UserId,
    ) -> Option<RefundOutcome> {
        if !funded {
            return None;
        }
        Some(self.ledger.refund(user_id, Timestamp::now()).await)
    }
}
