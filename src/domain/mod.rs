//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, errors, events)
//! - `studio` - Scheduled classes, categories and equipment
//! - `subscription` - Credit-bearing subscriptions
//! - `booking` - Booking aggregate, reservation errors and events
//! - `waitlist` - Waitlist entries and dense renumbering
//! - `eligibility` - Ordered booking eligibility rules

pub mod booking;
pub mod eligibility;
pub mod foundation;
pub mod studio;
pub mod subscription;
pub mod waitlist;
