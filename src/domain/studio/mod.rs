//! Studio domain module.
//!
//! Scheduled classes and the vocabulary shared with subscriptions:
//! categories, personal party sizes and equipment.

mod category;
mod class;
mod equipment;

pub use category::{ClassCategory, PartySize, SubscriptionCategory};
pub use class::{ClassDisplay, ClassStatus, StudioClass, MAX_GROUP_CAPACITY};
pub use equipment::Equipment;
