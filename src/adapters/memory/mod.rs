//! In-memory store adapters.
//!
//! Used by the test suite and for local runs without a database. Each
//! repository guards its map with a `tokio::sync::RwLock`; mutating calls
//! hold the write lock for their full duration.

mod booking_repository;
mod class_repository;
mod subscription_repository;
mod waitlist_repository;

pub use booking_repository::InMemoryBookingRepository;
pub use class_repository::InMemoryClassRepository;
pub use subscription_repository::InMemorySubscriptionRepository;
pub use waitlist_repository::InMemoryWaitlistRepository;
