//! Waitlist domain module.

mod entry;

pub use entry::{is_dense, next_position, plan_renumber, PositionChange, WaitlistEntry};
