//! Waitlist queue.
//!
//! Appends users to a class's waitlist, removes them, and keeps positions
//! dense. Callers hold the class lock; the position insert is still
//! optimistic so that several processes sharing one store stay correct.

use std::sync::Arc;

use crate::domain::booking::{ReservationError, ReservationEvent};
use crate::domain::foundation::{ErrorCode, EventId, Timestamp, UserId, WaitlistEntryId};
use crate::domain::studio::StudioClass;
use crate::domain::waitlist::{next_position, plan_renumber, PositionChange, WaitlistEntry};
use crate::ports::{BookingRepository, WaitlistRepository};

use super::Notifier;

#[derive(Clone)]
pub struct WaitlistQueue {
    waitlist: Arc<dyn WaitlistRepository>,
    bookings: Arc<dyn BookingRepository>,
    notifier: Notifier,
    max_attempts: u32,
}

impl WaitlistQueue {
    pub fn new(
        waitlist: Arc<dyn WaitlistRepository>,
        bookings: Arc<dyn BookingRepository>,
        notifier: Notifier,
        max_attempts: u32,
    ) -> Self {
        Self {
            waitlist,
            bookings,
            notifier,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Appends `user_id` to the class's waitlist and emits `waitlist_joined`.
    ///
    /// # Errors
    ///
    /// - `AlreadyBookedOrWaitlisted` if the user holds a seat or an entry
    /// - `WaitlistContention` after losing the position race `max_attempts` times
    #[tracing::instrument(skip_all, fields(class_id = %class.id, user_id = %user_id))]
    pub async fn enqueue(
        &self,
        user_id: &UserId,
        class: &StudioClass,
    ) -> Result<WaitlistEntry, ReservationError> {
        let already_booked = self
            .bookings
            .find_for_user_and_class(user_id, &class.id)
            .await?
            .is_some_and(|b| b.is_confirmed());
        let already_queued = self
            .waitlist
            .find_for_user_and_class(user_id, &class.id)
            .await?
            .is_some();
        if already_booked || already_queued {
            return Err(ReservationError::AlreadyBookedOrWaitlisted {
                user_id: user_id.clone(),
                class_id: class.id,
            });
        }

        for attempt in 1..=self.max_attempts {
            let position = next_position(self.waitlist.max_position(&class.id).await?);
            let entry =
                WaitlistEntry::enqueue(WaitlistEntryId::new(), user_id.clone(), class.id, position)?;

            match self.waitlist.insert(&entry).await {
                Ok(()) => {
                    tracing::info!(position, "user waitlisted");
                    self.notifier
                        .emit(ReservationEvent::WaitlistJoined {
                            event_id: EventId::new(),
                            entry_id: entry.id,
                            user_id: entry.user_id.clone(),
                            class_id: class.id,
                            position,
                            display: class.display(),
                            occurred_at: Timestamp::now(),
                        })
                        .await;
                    return Ok(entry);
                }
                Err(e) if e.code == ErrorCode::WaitlistPositionTaken => {
                    tracing::debug!(attempt, position, "waitlist position taken, retrying");
                }
                Err(e) if e.code == ErrorCode::DuplicateWaitlistEntry => {
                    return Err(ReservationError::AlreadyBookedOrWaitlisted {
                        user_id: user_id.clone(),
                        class_id: class.id,
                    });
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(ReservationError::WaitlistContention {
            class_id: class.id,
            attempts: self.max_attempts,
        })
    }

    /// Deletes an entry and closes the gap it left.
    ///
    /// Returns the renumbering that was applied.
    pub async fn remove(
        &self,
        entry: &WaitlistEntry,
        class: &StudioClass,
    ) -> Result<Vec<PositionChange>, ReservationError> {
        if !self.waitlist.delete(&entry.id).await? {
            tracing::debug!(entry_id = %entry.id, "waitlist entry already gone");
        }
        self.renumber_from(class).await
    }

    /// Reassigns positions `1..=N` in current order.
    ///
    /// Emits `waitlist_moved_up` for every entry whose position changed.
    pub async fn renumber_from(
        &self,
        class: &StudioClass,
    ) -> Result<Vec<PositionChange>, ReservationError> {
        let entries = self.waitlist.list_for_class(&class.id).await?;
        let plan = plan_renumber(&entries);

        for change in &plan {
            self.waitlist
                .update_position(&change.entry_id, change.to)
                .await?;
        }

        if !plan.is_empty() {
            tracing::debug!(class_id = %class.id, moved = plan.len(), "waitlist renumbered");
        }

        let display = class.display();
        self.notifier
            .emit_all(plan.iter().map(|change| ReservationEvent::WaitlistMovedUp {
                event_id: EventId::new(),
                entry_id: change.entry_id,
                user_id: change.user_id.clone(),
                class_id: class.id,
                position: change.to,
                display: display.clone(),
                occurred_at: Timestamp::now(),
            }))
            .await;

        Ok(plan)
    }

    pub async fn entries(&self, class: &StudioClass) -> Result<Vec<WaitlistEntry>, ReservationError> {
        Ok(self.waitlist.list_for_class(&class.id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{InMemoryBookingRepository, InMemoryEventBus, InMemoryWaitlistRepository};
    use crate::domain::foundation::{ClassId, DomainError, InstructorId};
    use crate::domain::studio::{ClassCategory, Equipment};
    use std::sync::atomic::{AtomicU32, Ordering};

    struct Fixture {
        queue: WaitlistQueue,
        bookings: Arc<InMemoryBookingRepository>,
        bus: Arc<InMemoryEventBus>,
        class: StudioClass,
    }

    /// Loses every position race: each insert finds its slot taken.
    struct Crowded {
        inner: InMemoryWaitlistRepository,
        inserts: AtomicU32,
    }

    #[async_trait::async_trait]
    impl WaitlistRepository for Crowded {
        async fn find_by_id(&self, id: &WaitlistEntryId) -> Result<Option<WaitlistEntry>, DomainError> {
            self.inner.find_by_id(id).await
        }

        async fn find_for_user_and_class(
            &self,
            user_id: &UserId,
            class_id: &ClassId,
        ) -> Result<Option<WaitlistEntry>, DomainError> {
            self.inner.find_for_user_and_class(user_id, class_id).await
        }

        async fn list_for_class(&self, class_id: &ClassId) -> Result<Vec<WaitlistEntry>, DomainError> {
            self.inner.list_for_class(class_id).await
        }

        async fn max_position(&self, class_id: &ClassId) -> Result<Option<u32>, DomainError> {
            self.inner.max_position(class_id).await
        }

        async fn insert(&self, entry: &WaitlistEntry) -> Result<(), DomainError> {
            self.inserts.fetch_add(1, Ordering::SeqCst);
            Err(DomainError::new(
                ErrorCode::WaitlistPositionTaken,
                format!("Position {} already taken", entry.position),
            ))
        }

        async fn delete(&self, id: &WaitlistEntryId) -> Result<bool, DomainError> {
            self.inner.delete(id).await
        }

        async fn update_position(&self, id: &WaitlistEntryId, position: u32) -> Result<(), DomainError> {
            self.inner.update_position(id, position).await
        }
    }

    fn fixture() -> Fixture {
        fixture_with(Arc::new(InMemoryWaitlistRepository::new()))
    }

    fn fixture_with(waitlist: Arc<dyn WaitlistRepository>) -> Fixture {
        let bookings = Arc::new(InMemoryBookingRepository::new());
        let bus = Arc::new(InMemoryEventBus::new());
        let queue = WaitlistQueue::new(
            waitlist,
            bookings.clone(),
            Notifier::new(bus.clone()),
            5,
        );
        let class = StudioClass::schedule(
            ClassId::new(),
            "Reformer Intro",
            Timestamp::now().add_days(3),
            50,
            1,
            ClassCategory::Group,
            Equipment::Reformer,
            InstructorId::new(),
        )
        .unwrap();
        Fixture {
            queue,
            bookings,
            bus,
            class,
        }
    }

    fn user(name: &str) -> UserId {
        UserId::new(name).unwrap()
    }

    #[tokio::test]
    async fn enqueue_assigns_increasing_positions() {
        let f = fixture();
        let a = f.queue.enqueue(&user("a"), &f.class).await.unwrap();
        let b = f.queue.enqueue(&user("b"), &f.class).await.unwrap();
        assert_eq!(a.position, 1);
        assert_eq!(b.position, 2);
        assert_eq!(f.bus.events_of_type("waitlist_joined").len(), 2);
    }

    #[tokio::test]
    async fn enqueue_rejects_duplicates() {
        let f = fixture();
        f.queue.enqueue(&user("a"), &f.class).await.unwrap();
        let err = f.queue.enqueue(&user("a"), &f.class).await.unwrap_err();
        assert!(matches!(err, ReservationError::AlreadyBookedOrWaitlisted { .. }));
    }

    #[tokio::test]
    async fn enqueue_rejects_seat_holder() {
        let f = fixture();
        f.bookings
            .confirm_if_room(&user("a"), &f.class.id, true, 1)
            .await
            .unwrap();
        let err = f.queue.enqueue(&user("a"), &f.class).await.unwrap_err();
        assert!(matches!(err, ReservationError::AlreadyBookedOrWaitlisted { .. }));
    }

    #[tokio::test]
    async fn removing_head_moves_everyone_up() {
        let f = fixture();
        let a = f.queue.enqueue(&user("a"), &f.class).await.unwrap();
        f.queue.enqueue(&user("b"), &f.class).await.unwrap();
        f.queue.enqueue(&user("c"), &f.class).await.unwrap();

        let moved = f.queue.remove(&a, &f.class).await.unwrap();
        assert_eq!(moved.len(), 2);

        let positions: Vec<(String, u32)> = f
            .queue
            .entries(&f.class)
            .await
            .unwrap()
            .into_iter()
            .map(|e| (e.user_id.to_string(), e.position))
            .collect();
        assert_eq!(positions, vec![("b".to_string(), 1), ("c".to_string(), 2)]);

        let moved_up = f.bus.events_of_type("waitlist_moved_up");
        assert_eq!(moved_up.len(), 2);
        assert_eq!(moved_up[0].payload["position"], 1);
    }

    #[tokio::test]
    async fn removing_tail_moves_nobody() {
        let f = fixture();
        f.queue.enqueue(&user("a"), &f.class).await.unwrap();
        let b = f.queue.enqueue(&user("b"), &f.class).await.unwrap();

        let moved = f.queue.remove(&b, &f.class).await.unwrap();
        assert!(moved.is_empty());
        assert!(!f.bus.has_event("waitlist_moved_up"));
    }

    #[tokio::test]
    async fn position_after_removal_reuses_freed_tail() {
        let f = fixture();
        let a = f.queue.enqueue(&user("a"), &f.class).await.unwrap();
        f.queue.enqueue(&user("b"), &f.class).await.unwrap();
        f.queue.remove(&a, &f.class).await.unwrap();

        let c = f.queue.enqueue(&user("c"), &f.class).await.unwrap();
        assert_eq!(c.position, 2);
    }

    #[tokio::test]
    async fn lost_position_races_end_in_contention() {
        let crowded = Arc::new(Crowded {
            inner: InMemoryWaitlistRepository::new(),
            inserts: AtomicU32::new(0),
        });
        let f = fixture_with(crowded.clone());

        let err = f.queue.enqueue(&user("a"), &f.class).await.unwrap_err();
        assert_eq!(
            err,
            ReservationError::WaitlistContention {
                class_id: f.class.id,
                attempts: 5,
            }
        );
        assert!(err.is_retryable());
        assert_eq!(crowded.inserts.load(Ordering::SeqCst), 5);
        assert!(f.queue.entries(&f.class).await.unwrap().is_empty());
        assert!(!f.bus.has_event("waitlist_joined"));
    }
}
