//! PostgreSQL implementation of BookingRepository.
//!
//! `confirm_if_room` runs in one transaction that first locks the class
//! row with `SELECT ... FOR UPDATE`. Concurrent claimers for the same
//! class queue on that lock, so the confirmed count they read cannot be
//! stale by the time they insert. The partial unique index on confirmed
//! (user, class) pairs backs the no-double-booking rule.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::codec::{corrupt, db_error, parse_user_id};
use crate::domain::booking::{Booking, BookingStatus, CancelledBy};
use crate::domain::foundation::{BookingId, ClassId, DomainError, ErrorCode, Timestamp, UserId};
use crate::ports::{BookingRepository, SeatClaim};

const BOOKING_COLUMNS: &str = "id, user_id, class_id, status, checked_in, cancelled_by, funded, \
                               version, created_at, updated_at, cancelled_at";

pub struct PostgresBookingRepository {
    pool: PgPool,
}

impl PostgresBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    user_id: String,
    class_id: Uuid,
    status: String,
    checked_in: bool,
    cancelled_by: Option<String>,
    funded: bool,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    cancelled_at: Option<DateTime<Utc>>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = DomainError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        Ok(Booking {
            id: BookingId::from_uuid(row.id),
            user_id: parse_user_id(row.user_id)?,
            class_id: ClassId::from_uuid(row.class_id),
            status: parse_status(&row.status)?,
            checked_in: row.checked_in,
            cancelled_by: row.cancelled_by.as_deref().map(parse_cancelled_by).transpose()?,
            funded: row.funded,
            version: row.version,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
            cancelled_at: row.cancelled_at.map(Timestamp::from_datetime),
        })
    }
}

fn parse_status(s: &str) -> Result<BookingStatus, DomainError> {
    match s {
        "confirmed" => Ok(BookingStatus::Confirmed),
        "cancelled" => Ok(BookingStatus::Cancelled),
        "completed" => Ok(BookingStatus::Completed),
        "no_show" => Ok(BookingStatus::NoShow),
        other => Err(corrupt("status", other)),
    }
}

fn parse_cancelled_by(s: &str) -> Result<CancelledBy, DomainError> {
    match s {
        "user" => Ok(CancelledBy::User),
        "studio" => Ok(CancelledBy::Studio),
        "reception" => Ok(CancelledBy::Reception),
        other => Err(corrupt("cancelled_by", other)),
    }
}

fn rows_to_bookings(rows: Vec<BookingRow>) -> Result<Vec<Booking>, DomainError> {
    rows.into_iter().map(Booking::try_from).collect()
}

async fn find_pair_for_update(
    tx: &mut Transaction<'_, Postgres>,
    user_id: &UserId,
    class_id: &ClassId,
) -> Result<Option<Booking>, DomainError> {
    let row: Option<BookingRow> = sqlx::query_as(&format!(
        r#"
        SELECT {BOOKING_COLUMNS}
        FROM bookings
        WHERE user_id = $1 AND class_id = $2
        ORDER BY (status = 'confirmed') DESC, updated_at DESC
        LIMIT 1
        FOR UPDATE
        "#
    ))
    .bind(user_id.as_str())
    .bind(class_id.as_uuid())
    .fetch_optional(&mut **tx)
    .await
    .map_err(|e| db_error("Failed to find booking", e))?;

    row.map(Booking::try_from).transpose()
}

#[async_trait]
impl BookingRepository for PostgresBookingRepository {
    async fn find_by_id(&self, id: &BookingId) -> Result<Option<Booking>, DomainError> {
        let row: Option<BookingRow> =
            sqlx::query_as(&format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"))
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_error("Failed to find booking", e))?;

        row.map(Booking::try_from).transpose()
    }

    async fn find_for_user_and_class(
        &self,
        user_id: &UserId,
        class_id: &ClassId,
    ) -> Result<Option<Booking>, DomainError> {
        let row: Option<BookingRow> = sqlx::query_as(&format!(
            r#"
            SELECT {BOOKING_COLUMNS}
            FROM bookings
            WHERE user_id = $1 AND class_id = $2
            ORDER BY (status = 'confirmed') DESC, updated_at DESC
            LIMIT 1
            "#
        ))
        .bind(user_id.as_str())
        .bind(class_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to find booking", e))?;

        row.map(Booking::try_from).transpose()
    }

    async fn count_confirmed(&self, class_id: &ClassId) -> Result<u32, DomainError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM bookings WHERE class_id = $1 AND status = 'confirmed'",
        )
        .bind(class_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("Failed to count bookings", e))?;

        u32::try_from(count).map_err(|_| corrupt("count", count))
    }

    async fn list_for_class(&self, class_id: &ClassId) -> Result<Vec<Booking>, DomainError> {
        let rows: Vec<BookingRow> = sqlx::query_as(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE class_id = $1 ORDER BY created_at ASC"
        ))
        .bind(class_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list bookings", e))?;

        rows_to_bookings(rows)
    }

    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Booking>, DomainError> {
        let rows: Vec<BookingRow> = sqlx::query_as(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list bookings", e))?;

        rows_to_bookings(rows)
    }

    async fn confirm_if_room(
        &self,
        user_id: &UserId,
        class_id: &ClassId,
        funded: bool,
        capacity: u32,
    ) -> Result<SeatClaim, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("Failed to begin transaction", e))?;

        // Serializes every claimer of this class until commit
        sqlx::query("SELECT id FROM classes WHERE id = $1 FOR UPDATE")
            .bind(class_id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| db_error("Failed to lock class", e))?;

        let existing = find_pair_for_update(&mut tx, user_id, class_id).await?;
        if let Some(booking) = existing.as_ref().filter(|b| b.is_confirmed()) {
            return Ok(SeatClaim::AlreadyConfirmed(booking.clone()));
        }

        let confirmed: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM bookings WHERE class_id = $1 AND status = 'confirmed'",
        )
        .bind(class_id.as_uuid())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| db_error("Failed to count bookings", e))?;

        if confirmed >= i64::from(capacity) {
            return Ok(SeatClaim::Full);
        }

        let row: BookingRow = match existing.filter(|b| b.status == BookingStatus::Cancelled) {
            Some(reused) => sqlx::query_as(&format!(
                r#"
                UPDATE bookings SET
                    status = 'confirmed',
                    funded = $2,
                    checked_in = FALSE,
                    cancelled_by = NULL,
                    cancelled_at = NULL,
                    updated_at = NOW(),
                    version = version + 1
                WHERE id = $1
                RETURNING {BOOKING_COLUMNS}
                "#
            ))
            .bind(reused.id.as_uuid())
            .bind(funded)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| db_error("Failed to reconfirm booking", e))?,
            None => sqlx::query_as(&format!(
                r#"
                INSERT INTO bookings (id, user_id, class_id, status, funded)
                VALUES ($1, $2, $3, 'confirmed', $4)
                RETURNING {BOOKING_COLUMNS}
                "#
            ))
            .bind(Uuid::new_v4())
            .bind(user_id.as_str())
            .bind(class_id.as_uuid())
            .bind(funded)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| db_error("Failed to insert booking", e))?,
        };

        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit booking", e))?;

        Ok(SeatClaim::Confirmed(Booking::try_from(row)?))
    }

    async fn compare_and_set(
        &self,
        booking: &Booking,
        expected_version: i64,
    ) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE bookings SET
                status = $3,
                checked_in = $4,
                cancelled_by = $5,
                funded = $6,
                version = $7,
                updated_at = $8,
                cancelled_at = $9
            WHERE id = $1 AND version = $2
            "#,
        )
        .bind(booking.id.as_uuid())
        .bind(expected_version)
        .bind(booking.status.as_str())
        .bind(booking.checked_in)
        .bind(booking.cancelled_by.map(|c| c.as_str()))
        .bind(booking.funded)
        .bind(booking.version)
        .bind(booking.updated_at.as_datetime())
        .bind(booking.cancelled_at.as_ref().map(|t| *t.as_datetime()))
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to update booking", e))?;

        if result.rows_affected() == 1 {
            return Ok(true);
        }

        match self.find_by_id(&booking.id).await? {
            Some(_) => Ok(false),
            None => Err(DomainError::new(
                ErrorCode::BookingNotFound,
                format!("Booking not found: {}", booking.id),
            )),
        }
    }

    async fn delete(&self, id: &BookingId) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM bookings WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to delete booking", e))?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_text() {
        for status in [
            BookingStatus::Confirmed,
            BookingStatus::Cancelled,
            BookingStatus::Completed,
            BookingStatus::NoShow,
        ] {
            assert_eq!(parse_status(status.as_str()).unwrap(), status);
        }
        assert!(parse_status("pending").is_err());
    }

    #[test]
    fn cancelled_by_round_trips_through_text() {
        for by in [CancelledBy::User, CancelledBy::Studio, CancelledBy::Reception] {
            assert_eq!(parse_cancelled_by(by.as_str()).unwrap(), by);
        }
        assert!(parse_cancelled_by("robot").is_err());
    }

    #[test]
    fn row_converts_to_booking() {
        let now = Utc::now();
        let row = BookingRow {
            id: Uuid::new_v4(),
            user_id: "member-5".to_string(),
            class_id: Uuid::new_v4(),
            status: "cancelled".to_string(),
            checked_in: false,
            cancelled_by: Some("reception".to_string()),
            funded: true,
            version: 3,
            created_at: now,
            updated_at: now,
            cancelled_at: Some(now),
        };

        let booking = Booking::try_from(row).unwrap();
        assert_eq!(booking.status, BookingStatus::Cancelled);
        assert_eq!(booking.cancelled_by, Some(CancelledBy::Reception));
        assert!(booking.funded);
        assert_eq!(booking.version, 3);
    }
}
