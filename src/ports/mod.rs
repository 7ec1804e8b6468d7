//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the reservation domain and the outside world. Adapters implement them.
//!
//! ## Store Ports
//!
//! - `ClassRepository` - Scheduled classes (read side for this engine)
//! - `BookingRepository` - Bookings, including the capacity-safe insert
//! - `WaitlistRepository` - Ordered waitlist entries
//! - `SubscriptionRepository` - Subscriptions and fallback credit balances
//!
//! ## Event Ports
//!
//! - `EventPublisher` - Notification sink for reservation events

mod booking_repository;
mod class_repository;
mod event_publisher;
mod subscription_repository;
mod waitlist_repository;

pub use booking_repository::{BookingRepository, SeatClaim};
pub use class_repository::ClassRepository;
pub use event_publisher::EventPublisher;
pub use subscription_repository::SubscriptionRepository;
pub use waitlist_repository::WaitlistRepository;
