//! Studio Reservations - class booking, credit ledger and waitlist engine
//!
//! This crate reserves seats in fitness-studio classes. Full classes route
//! users to an ordered waitlist, seats are paid for with subscription
//! credits, and a freed seat is offered down the waitlist until someone
//! can take it.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
