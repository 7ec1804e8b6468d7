//! Studio reservations service.
//!
//! Loads configuration, initialises logging and wires the reservation
//! engine against PostgreSQL when `STUDIO_RESERVATIONS__DATABASE__URL` is
//! set, or in-memory stores otherwise. Runs until interrupted.

use std::sync::Arc;

use studio_reservations::adapters::postgres::{
    self, PostgresBookingRepository, PostgresClassRepository, PostgresSubscriptionRepository,
    PostgresWaitlistRepository,
};
use studio_reservations::adapters::{
    InMemoryBookingRepository, InMemoryClassRepository, InMemorySubscriptionRepository,
    InMemoryWaitlistRepository, TracingEventSink,
};
use studio_reservations::application::{ReservationManager, ReservationPorts};
use studio_reservations::config::{AppConfig, LoggingConfig};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let config = AppConfig::load()?;
    init_tracing(&config.logging)?;
    config.validate()?;

    let ports = if config.database.is_configured() {
        let pool = postgres::connect(&config.database).await?;
        if config.database.run_migrations {
            postgres::run_migrations(&pool).await?;
            tracing::info!("migrations applied");
        }
        tracing::info!(max_connections = config.database.max_connections, "using postgres store");
        ReservationPorts {
            classes: Arc::new(PostgresClassRepository::new(pool.clone())),
            bookings: Arc::new(PostgresBookingRepository::new(pool.clone())),
            waitlist: Arc::new(PostgresWaitlistRepository::new(pool.clone())),
            subscriptions: Arc::new(PostgresSubscriptionRepository::new(pool)),
            publisher: Arc::new(TracingEventSink::new()),
        }
    } else {
        tracing::warn!("no database configured, using in-memory store");
        ReservationPorts {
            classes: Arc::new(InMemoryClassRepository::new()),
            bookings: Arc::new(InMemoryBookingRepository::new()),
            waitlist: Arc::new(InMemoryWaitlistRepository::new()),
            subscriptions: Arc::new(InMemorySubscriptionRepository::new()),
            publisher: Arc::new(TracingEventSink::new()),
        }
    };

    let _manager = ReservationManager::new(ports, &config.booking);
    tracing::info!(
        promotion_lead_time_minutes = config.booking.promotion_lead_time_minutes,
        "reservation engine ready"
    );

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    Ok(())
}

fn init_tracing(config: &LoggingConfig) -> Result<(), BoxError> {
    let filter = config.env_filter()?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if config.json {
        builder.json().try_init()?;
    } else {
        builder.try_init()?;
    }
    Ok(())
}
