//! Reservation engine components.
//!
//! Handlers compose these under the per-class lock from [`ClassLocks`].

mod class_locks;
mod context;
mod credit_ledger;
mod gatekeeper;
mod notifier;
mod promotion;
mod waitlist_queue;

pub use class_locks::ClassLocks;
pub use context::{EngineContext, ReservationPorts};
pub use credit_ledger::{Charge, CreditLedger, LedgerError, RefundOutcome};
pub use gatekeeper::{Capacity, CapacityGatekeeper};
pub use notifier::Notifier;
pub use promotion::{CascadeReport, PromotionCascade, PromotionOutcome, SkippedEntry, StopReason};
pub use waitlist_queue::WaitlistQueue;
