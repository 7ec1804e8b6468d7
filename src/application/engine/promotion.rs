//! Promotion cascade.
//!
//! Offers a freed seat to the waitlist, head first. Entries that can no
//! longer take the seat are dropped and the next one is tried: the user
//! already holds a seat on this class, fails eligibility, or is out of
//! credit. The
//! loop walks one snapshot of the waitlist, so it terminates after at
//! most one pass. At most one user is promoted per run.
//!
//! Callers hold the class lock.

use chrono::Duration;
use std::sync::Arc;

use crate::domain::booking::{Booking, ReservationError, ReservationEvent};
use crate::domain::eligibility::{self, Override};
use crate::domain::foundation::{EventId, Timestamp, UserId, WaitlistEntryId};
use crate::domain::studio::StudioClass;
use crate::domain::waitlist::WaitlistEntry;
use crate::ports::{BookingRepository, SeatClaim};

use super::{CapacityGatekeeper, CreditLedger, LedgerError, Notifier, WaitlistQueue};

/// Why the cascade ended without promoting anyone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    ClassNotBookable,
    /// Class starts within the promotion lead time.
    TooCloseToStart,
    /// No seat was actually free.
    NoSeat,
    WaitlistEmpty,
    /// Every entry in the snapshot was skipped.
    WaitlistExhausted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromotionOutcome {
    Promoted {
        booking: Booking,
        entry_id: WaitlistEntryId,
    },
    NoPromotion(StopReason),
}

impl PromotionOutcome {
    pub fn promoted(&self) -> Option<&Booking> {
        match self {
            PromotionOutcome::Promoted { booking, .. } => Some(booking),
            PromotionOutcome::NoPromotion(_) => None,
        }
    }
}

/// An entry dropped from the waitlist during a cascade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    pub entry_id: WaitlistEntryId,
    pub user_id: UserId,
    pub reason: ReservationError,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadeReport {
    pub outcome: PromotionOutcome,
    pub skipped: Vec<SkippedEntry>,
}

impl CascadeReport {
    fn stopped(reason: StopReason, skipped: Vec<SkippedEntry>) -> Self {
        Self {
            outcome: PromotionOutcome::NoPromotion(reason),
            skipped,
        }
    }
}

enum Attempt {
    Promoted(Booking),
    Skip(ReservationError),
    SeatGone,
}

#[derive(Clone)]
pub struct PromotionCascade {
    lead_time: Duration,
    bookings: Arc<dyn BookingRepository>,
    ledger: CreditLedger,
    gatekeeper: CapacityGatekeeper,
    queue: WaitlistQueue,
    notifier: Notifier,
}

impl PromotionCascade {
    pub fn new(
        lead_time: Duration,
        bookings: Arc<dyn BookingRepository>,
        ledger: CreditLedger,
        gatekeeper: CapacityGatekeeper,
        queue: WaitlistQueue,
        notifier: Notifier,
    ) -> Self {
        Self {
            lead_time,
            bookings,
            ledger,
            gatekeeper,
            queue,
            notifier,
        }
    }

    /// Runs one cascade for `class`.
    ///
    /// # Errors
    ///
    /// Store failures and credit contention abort the cascade. The entry
    /// being tried keeps its place; entries already dropped stay dropped.
    #[tracing::instrument(skip_all, fields(class_id = %class.id))]
    pub async fn run(
        &self,
        class: &StudioClass,
        now: Timestamp,
    ) -> Result<CascadeReport, ReservationError> {
        if !class.is_bookable() {
            return Ok(CascadeReport::stopped(StopReason::ClassNotBookable, vec![]));
        }
        if !class.accepts_promotions(now, self.lead_time) {
            tracing::debug!("class starts within promotion lead time");
            return Ok(CascadeReport::stopped(StopReason::TooCloseToStart, vec![]));
        }
        if !self.gatekeeper.check(class).await?.has_room() {
            return Ok(CascadeReport::stopped(StopReason::NoSeat, vec![]));
        }

        let snapshot = self.queue.entries(class).await?;
        if snapshot.is_empty() {
            return Ok(CascadeReport::stopped(StopReason::WaitlistEmpty, vec![]));
        }

        let mut skipped = Vec::new();
        for entry in snapshot {
            match self.attempt(&entry, class, now).await? {
                Attempt::Promoted(booking) => {
                    self.queue.remove(&entry, class).await?;
                    tracing::info!(
                        user_id = %entry.user_id,
                        booking_id = %booking.id,
                        "waitlist head promoted"
                    );
                    self.notifier
                        .emit(ReservationEvent::WaitlistPromoted {
                            event_id: EventId::new(),
                            booking_id: booking.id,
                            user_id: booking.user_id.clone(),
                            class_id: class.id,
                            display: class.display(),
                            occurred_at: Timestamp::now(),
                        })
                        .await;
                    return Ok(CascadeReport {
                        outcome: PromotionOutcome::Promoted {
                            booking,
                            entry_id: entry.id,
                        },
                        skipped,
                    });
                }
                Attempt::Skip(reason) => {
                    tracing::info!(
                        user_id = %entry.user_id,
                        reason = %reason,
                        "dropping waitlist entry that cannot be promoted"
                    );
                    self.queue.remove(&entry, class).await?;
                    skipped.push(SkippedEntry {
                        entry_id: entry.id,
                        user_id: entry.user_id,
                        reason,
                    });
                }
                Attempt::SeatGone => {
                    return Ok(CascadeReport::stopped(StopReason::NoSeat, skipped));
                }
            }
        }

        Ok(CascadeReport::stopped(StopReason::WaitlistExhausted, skipped))
    }

    async fn attempt(
        &self,
        entry: &WaitlistEntry,
        class: &StudioClass,
        now: Timestamp,
    ) -> Result<Attempt, ReservationError> {
        let user_id = &entry.user_id;

        let holds_seat = self
            .bookings
            .find_for_user_and_class(user_id, &class.id)
            .await?
            .is_some_and(|b| b.is_confirmed());
        if holds_seat {
            return Ok(Attempt::Skip(ReservationError::AlreadyBookedOrWaitlisted {
                user_id: user_id.clone(),
                class_id: class.id,
            }));
        }

        let subscription = self.ledger.active_subscription(user_id, now).await?;
        if let Err(e) = eligibility::check(user_id, subscription.as_ref(), class, now, Override::None)
        {
            return Ok(Attempt::Skip(e));
        }

        let charge = match self.ledger.deduct(user_id, now).await {
            Ok(charge) => charge,
            Err(e @ (LedgerError::Store(_) | LedgerError::Contention { .. })) => {
                return Err(e.into())
            }
            Err(e) => return Ok(Attempt::Skip(e.into())),
        };
        let funded = charge.is_charged();

        let claim = match self.gatekeeper.claim(user_id, class, funded).await {
            Ok(claim) => claim,
            Err(e) => {
                self.refund_if(funded, user_id, now).await;
                return Err(e.into());
            }
        };

        match claim {
            SeatClaim::Confirmed(booking) => Ok(Attempt::Promoted(booking)),
            SeatClaim::Full => {
                self.refund_if(funded, user_id, now).await;
                Ok(Attempt::SeatGone)
            }
            SeatClaim::AlreadyConfirmed(_) => {
                self.refund_if(funded, user_id, now).await;
                Ok(Attempt::Skip(ReservationError::AlreadyBookedOrWaitlisted {
                    user_id: user_id.clone(),
                    class_id: class.id,
                }))
            }
        }
    }

    async fn refund_if(&self, funded: bool, user_id: &UserId, now: Timestamp) {
        if funded {
            self.ledger.refund(user_id, now).await;
        }
    }
}
