//! Application handlers.
//!
//! Command and query handlers that orchestrate the reservation engine.

pub mod reservation;

pub use reservation::*;
