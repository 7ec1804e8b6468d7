//! Shared in-memory harness for handler tests.

use std::sync::Arc;

use crate::adapters::{
    InMemoryBookingRepository, InMemoryClassRepository, InMemoryEventBus,
    InMemorySubscriptionRepository, InMemoryWaitlistRepository,
};
use crate::application::engine::{EngineContext, ReservationPorts};
use crate::config::BookingRules;
use crate::domain::foundation::{ClassId, InstructorId, SubscriptionId, Timestamp, UserId};
use crate::domain::studio::{ClassCategory, Equipment, StudioClass, SubscriptionCategory};
use crate::domain::subscription::{CreditAllowance, Subscription};
use crate::ports::{BookingRepository, ClassRepository, SubscriptionRepository};

pub struct Harness {
    pub ctx: EngineContext,
    pub classes: Arc<InMemoryClassRepository>,
    pub bookings: Arc<InMemoryBookingRepository>,
    pub waitlist: Arc<InMemoryWaitlistRepository>,
    pub subscriptions: Arc<InMemorySubscriptionRepository>,
    pub bus: Arc<InMemoryEventBus>,
}

impl Harness {
    pub fn new() -> Self {
        let bookings = Arc::new(InMemoryBookingRepository::new());
        Self::with_booking_store(bookings.clone(), bookings)
    }

    /// Engine writes bookings through `store`; `bookings` is the backing
    /// repository tests inspect.
    pub fn with_booking_store(
        bookings: Arc<InMemoryBookingRepository>,
        store: Arc<dyn BookingRepository>,
    ) -> Self {
        let classes = Arc::new(InMemoryClassRepository::new());
        let waitlist = Arc::new(InMemoryWaitlistRepository::new());
        let subscriptions = Arc::new(InMemorySubscriptionRepository::new());
        let bus = Arc::new(InMemoryEventBus::new());

        let ctx = EngineContext::new(
            ReservationPorts {
                classes: classes.clone(),
                bookings: store,
                waitlist: waitlist.clone(),
                subscriptions: subscriptions.clone(),
                publisher: bus.clone(),
            },
            &BookingRules::default(),
        );

        Self {
            ctx,
            classes,
            bookings,
            waitlist,
            subscriptions,
            bus,
        }
    }

    pub async fn class(&self, capacity: u32, starts_in_hours: i64) -> StudioClass {
        let class = StudioClass::schedule(
            ClassId::new(),
            "Mat Pilates",
            Timestamp::now().plus_hours(starts_in_hours),
            50,
            capacity,
            ClassCategory::Group,
            Equipment::Mat,
            InstructorId::new(),
        )
        .unwrap();
        self.classes.save(&class).await.unwrap();
        class
    }

    pub async fn subscribe(&self, name: &str, credits: CreditAllowance) -> Subscription {
        let subscription = Subscription::activate(
            SubscriptionId::new(),
            user(name),
            SubscriptionCategory::Group,
            Equipment::Both,
            credits,
            Timestamp::now().add_days(30),
        )
        .unwrap();
        self.subscriptions.save(&subscription).await.unwrap();
        subscription
    }

    pub async fn credits(&self, name: &str) -> Option<u32> {
        let subs = self.subscriptions.find_for_user(&user(name)).await.unwrap();
        subs.first().and_then(|s| s.credits.remaining())
    }
}

pub fn user(name: &str) -> UserId {
    UserId::new(name).unwrap()
}
