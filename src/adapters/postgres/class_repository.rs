//! PostgreSQL implementation of ClassRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::codec::{db_error, corrupt, from_db_int, parse_equipment, to_db_int};
use crate::domain::foundation::{ClassId, DomainError, InstructorId, Timestamp};
use crate::domain::studio::{ClassCategory, ClassStatus, StudioClass};
use crate::ports::ClassRepository;

pub struct PostgresClassRepository {
    pool: PgPool,
}

impl PostgresClassRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ClassRow {
    id: Uuid,
    name: String,
    starts_at: DateTime<Utc>,
    duration_minutes: i32,
    capacity: i32,
    category: String,
    equipment: String,
    instructor_id: Uuid,
    status: String,
}

impl TryFrom<ClassRow> for StudioClass {
    type Error = DomainError;

    fn try_from(row: ClassRow) -> Result<Self, Self::Error> {
        Ok(StudioClass {
            id: ClassId::from_uuid(row.id),
            name: row.name,
            starts_at: Timestamp::from_datetime(row.starts_at),
            duration_minutes: from_db_int("duration_minutes", row.duration_minutes)?,
            capacity: from_db_int("capacity", row.capacity)?,
            category: parse_category(&row.category)?,
            equipment: parse_equipment(&row.equipment)?,
            instructor_id: InstructorId::from_uuid(row.instructor_id),
            status: parse_status(&row.status)?,
        })
    }
}

fn parse_category(s: &str) -> Result<ClassCategory, DomainError> {
    match s {
        "group" => Ok(ClassCategory::Group),
        "personal" => Ok(ClassCategory::Personal),
        other => Err(corrupt("category", other)),
    }
}

fn parse_status(s: &str) -> Result<ClassStatus, DomainError> {
    match s {
        "active" => Ok(ClassStatus::Active),
        "cancelled" => Ok(ClassStatus::Cancelled),
        other => Err(corrupt("status", other)),
    }
}

fn status_to_string(status: ClassStatus) -> &'static str {
    match status {
        ClassStatus::Active => "active",
        ClassStatus::Cancelled => "cancelled",
    }
}

#[async_trait]
impl ClassRepository for PostgresClassRepository {
    async fn find_by_id(&self, id: &ClassId) -> Result<Option<StudioClass>, DomainError> {
        let row: Option<ClassRow> = sqlx::query_as(
            r#"
            SELECT id, name, starts_at, duration_minutes, capacity, category,
                   equipment, instructor_id, status
            FROM classes
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to find class", e))?;

        row.map(StudioClass::try_from).transpose()
    }

    async fn save(&self, class: &StudioClass) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO classes (
                id, name, starts_at, duration_minutes, capacity, category,
                equipment, instructor_id, status
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                starts_at = EXCLUDED.starts_at,
                duration_minutes = EXCLUDED.duration_minutes,
                capacity = EXCLUDED.capacity,
                category = EXCLUDED.category,
                equipment = EXCLUDED.equipment,
                instructor_id = EXCLUDED.instructor_id,
                status = EXCLUDED.status
            "#,
        )
        .bind(class.id.as_uuid())
        .bind(&class.name)
        .bind(class.starts_at.as_datetime())
        .bind(to_db_int("duration_minutes", class.duration_minutes)?)
        .bind(to_db_int("capacity", class.capacity)?)
        .bind(class.category.as_str())
        .bind(class.equipment.as_str())
        .bind(class.instructor_id.as_uuid())
        .bind(status_to_string(class.status))
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to save class", e))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_category_accepts_known_values() {
        assert_eq!(parse_category("group").unwrap(), ClassCategory::Group);
        assert_eq!(parse_category("personal").unwrap(), ClassCategory::Personal);
        assert!(parse_category("open_gym").is_err());
    }

    #[test]
    fn status_round_trips() {
        for status in [ClassStatus::Active, ClassStatus::Cancelled] {
            assert_eq!(parse_status(status_to_string(status)).unwrap(), status);
        }
    }

    #[test]
    fn row_with_negative_capacity_is_rejected() {
        let row = ClassRow {
            id: Uuid::new_v4(),
            name: "Core".to_string(),
            starts_at: Utc::now(),
            duration_minutes: 45,
            capacity: -2,
            category: "group".to_string(),
            equipment: "mat".to_string(),
            instructor_id: Uuid::new_v4(),
            status: "active".to_string(),
        };
        assert!(StudioClass::try_from(row).is_err());
    }
}
