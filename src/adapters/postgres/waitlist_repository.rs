//! PostgreSQL implementation of WaitlistRepository.
//!
//! Uniqueness violations are mapped by constraint name so the queue can
//! tell a duplicate user from a lost race for a position.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::codec::{db_error, from_db_int, parse_user_id, to_db_int, violated_constraint};
use crate::domain::foundation::{
    ClassId, DomainError, ErrorCode, Timestamp, UserId, WaitlistEntryId,
};
use crate::domain::waitlist::WaitlistEntry;
use crate::ports::WaitlistRepository;

const USER_CLASS_KEY: &str = "waitlist_user_class_key";
const CLASS_POSITION_KEY: &str = "waitlist_class_position_key";

pub struct PostgresWaitlistRepository {
    pool: PgPool,
}

impl PostgresWaitlistRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct WaitlistRow {
    id: Uuid,
    user_id: String,
    class_id: Uuid,
    position: i32,
    created_at: DateTime<Utc>,
}

impl TryFrom<WaitlistRow> for WaitlistEntry {
    type Error = DomainError;

    fn try_from(row: WaitlistRow) -> Result<Self, Self::Error> {
        Ok(WaitlistEntry {
            id: WaitlistEntryId::from_uuid(row.id),
            user_id: parse_user_id(row.user_id)?,
            class_id: ClassId::from_uuid(row.class_id),
            position: from_db_int("position", row.position)?,
            created_at: Timestamp::from_datetime(row.created_at),
        })
    }
}

fn map_write_error(context: &str, err: sqlx::Error) -> DomainError {
    match violated_constraint(&err).as_deref() {
        Some(USER_CLASS_KEY) => DomainError::new(
            ErrorCode::DuplicateWaitlistEntry,
            "User is already on the waitlist for this class",
        ),
        Some(CLASS_POSITION_KEY) => DomainError::new(
            ErrorCode::WaitlistPositionTaken,
            "Waitlist position already taken",
        ),
        _ => db_error(context, err),
    }
}

#[async_trait]
impl WaitlistRepository for PostgresWaitlistRepository {
    async fn find_by_id(&self, id: &WaitlistEntryId) -> Result<Option<WaitlistEntry>, DomainError> {
        let row: Option<WaitlistRow> = sqlx::query_as(
            "SELECT id, user_id, class_id, position, created_at FROM waitlist WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to find waitlist entry", e))?;

        row.map(WaitlistEntry::try_from).transpose()
    }

    async fn find_for_user_and_class(
        &self,
        user_id: &UserId,
        class_id: &ClassId,
    ) -> Result<Option<WaitlistEntry>, DomainError> {
        let row: Option<WaitlistRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, class_id, position, created_at
            FROM waitlist
            WHERE user_id = $1 AND class_id = $2
            "#,
        )
        .bind(user_id.as_str())
        .bind(class_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to find waitlist entry", e))?;

        row.map(WaitlistEntry::try_from).transpose()
    }

    async fn list_for_class(&self, class_id: &ClassId) -> Result<Vec<WaitlistEntry>, DomainError> {
        let rows: Vec<WaitlistRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, class_id, position, created_at
            FROM waitlist
            WHERE class_id = $1
            ORDER BY position ASC
            "#,
        )
        .bind(class_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list waitlist", e))?;

        rows.into_iter().map(WaitlistEntry::try_from).collect()
    }

    async fn max_position(&self, class_id: &ClassId) -> Result<Option<u32>, DomainError> {
        let max: Option<i32> =
            sqlx::query_scalar("SELECT MAX(position) FROM waitlist WHERE class_id = $1")
                .bind(class_id.as_uuid())
                .fetch_one(&self.pool)
                .await
                .map_err(|e| db_error("Failed to read waitlist length", e))?;

        max.map(|p| from_db_int("position", p)).transpose()
    }

    async fn insert(&self, entry: &WaitlistEntry) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO waitlist (id, user_id, class_id, position, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(entry.id.as_uuid())
        .bind(entry.user_id.as_str())
        .bind(entry.class_id.as_uuid())
        .bind(to_db_int("position", entry.position)?)
        .bind(entry.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error("Failed to insert waitlist entry", e))?;

        Ok(())
    }

    async fn delete(&self, id: &WaitlistEntryId) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM waitlist WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to delete waitlist entry", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_position(&self, id: &WaitlistEntryId, position: u32) -> Result<(), DomainError> {
        let result = sqlx::query("UPDATE waitlist SET position = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(to_db_int("position", position)?)
            .execute(&self.pool)
            .await
            .map_err(|e| map_write_error("Failed to move waitlist entry", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::WaitlistEntryNotFound,
                format!("Waitlist entry not found: {}", id),
            ));
        }
        Ok(())
    }
}
