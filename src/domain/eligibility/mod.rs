//! Eligibility domain module.
//!
//! Pure rules deciding whether a booking attempt may proceed.

mod rules;

pub use rules::{check, Override};
