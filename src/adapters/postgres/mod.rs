//! PostgreSQL adapters - sqlx implementations of the store ports.
//!
//! - `PostgresClassRepository` - `classes`
//! - `PostgresBookingRepository` - `bookings`, with the capacity-safe insert
//! - `PostgresWaitlistRepository` - `waitlist`
//! - `PostgresSubscriptionRepository` - `user_subscriptions` and `user_credit_balances`

mod booking_repository;
mod class_repository;
mod codec;
mod subscription_repository;
mod waitlist_repository;

pub use booking_repository::PostgresBookingRepository;
pub use class_repository::PostgresClassRepository;
pub use subscription_repository::PostgresSubscriptionRepository;
pub use waitlist_repository::PostgresWaitlistRepository;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::DatabaseConfig;
use crate::domain::foundation::{DomainError, ErrorCode};

/// Open a connection pool sized from configuration.
///
/// # Errors
///
/// `ValidationFailed` when no URL is configured, `DatabaseError` when the
/// database is unreachable.
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, DomainError> {
    let url = config
        .url()
        .ok_or_else(|| DomainError::validation("database.url", "no database URL configured"))?;

    PgPoolOptions::new()
        .min_connections(config.min_connections)
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout())
        .idle_timeout(config.idle_timeout())
        .connect(url)
        .await
        .map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Failed to connect: {}", e))
        })
}

/// Apply the schema in `migrations/`.
pub async fn run_migrations(pool: &PgPool) -> Result<(), DomainError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| DomainError::new(ErrorCode::DatabaseError, format!("Migration failed: {}", e)))
}
