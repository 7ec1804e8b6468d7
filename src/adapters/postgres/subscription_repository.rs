//! PostgreSQL implementation of SubscriptionRepository.
//!
//! `remaining_credits IS NULL` stores an unlimited plan. Personal
//! subscriptions carry their party size in `party_size`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::codec::{corrupt, db_error, from_db_int, parse_equipment, parse_user_id, to_db_int};
use crate::domain::foundation::{DomainError, ErrorCode, SubscriptionId, Timestamp, UserId};
use crate::domain::studio::{PartySize, SubscriptionCategory};
use crate::domain::subscription::{CreditAllowance, Subscription, SubscriptionStatus};
use crate::ports::SubscriptionRepository;

pub struct PostgresSubscriptionRepository {
    pool: PgPool,
}

impl PostgresSubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    id: Uuid,
    user_id: String,
    status: String,
    category: String,
    party_size: Option<i32>,
    equipment: String,
    remaining_credits: Option<i32>,
    ends_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: i64,
}

impl TryFrom<SubscriptionRow> for Subscription {
    type Error = DomainError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        let category = parse_category(&row.category, row.party_size)?;
        let credits = match row.remaining_credits {
            None => CreditAllowance::Unlimited,
            Some(n) => CreditAllowance::Metered(from_db_int("remaining_credits", n)?),
        };

        Ok(Subscription {
            id: SubscriptionId::from_uuid(row.id),
            user_id: parse_user_id(row.user_id)?,
            status: parse_status(&row.status)?,
            category,
            equipment: parse_equipment(&row.equipment)?,
            credits,
            ends_at: Timestamp::from_datetime(row.ends_at),
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
            version: row.version,
        })
    }
}

fn parse_category(category: &str, party_size: Option<i32>) -> Result<SubscriptionCategory, DomainError> {
    match (category, party_size) {
        ("group", None) => Ok(SubscriptionCategory::Group),
        ("personal", Some(seats)) => {
            let seats = from_db_int("party_size", seats)?;
            PartySize::from_seats(seats)
                .map(SubscriptionCategory::Personal)
                .map_err(|_| corrupt("party_size", seats))
        }
        (other, _) => Err(corrupt("category", other)),
    }
}

fn parse_status(s: &str) -> Result<SubscriptionStatus, DomainError> {
    match s {
        "active" => Ok(SubscriptionStatus::Active),
        "expired" => Ok(SubscriptionStatus::Expired),
        other => Err(corrupt("status", other)),
    }
}

fn status_to_string(status: SubscriptionStatus) -> &'static str {
    match status {
        SubscriptionStatus::Active => "active",
        SubscriptionStatus::Expired => "expired",
    }
}

fn credits_column(credits: CreditAllowance) -> Result<Option<i32>, DomainError> {
    credits
        .remaining()
        .map(|n| to_db_int("remaining_credits", n))
        .transpose()
}

fn party_size_column(category: SubscriptionCategory) -> Option<i32> {
    category.party_size().map(|p| p.seats() as i32)
}

#[async_trait]
impl SubscriptionRepository for PostgresSubscriptionRepository {
    async fn find_for_user(&self, user_id: &UserId) -> Result<Vec<Subscription>, DomainError> {
        let rows: Vec<SubscriptionRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, status, category, party_size, equipment,
                   remaining_credits, ends_at, created_at, updated_at, version
            FROM user_subscriptions
            WHERE user_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to find subscriptions", e))?;

        rows.into_iter().map(Subscription::try_from).collect()
    }

    async fn save(&self, subscription: &Subscription) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO user_subscriptions (
                id, user_id, status, category, party_size, equipment,
                remaining_credits, ends_at, created_at, updated_at, version
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (id) DO UPDATE SET
                status = EXCLUDED.status,
                category = EXCLUDED.category,
                party_size = EXCLUDED.party_size,
                equipment = EXCLUDED.equipment,
                remaining_credits = EXCLUDED.remaining_credits,
                ends_at = EXCLUDED.ends_at,
                updated_at = EXCLUDED.updated_at,
                version = EXCLUDED.version
            "#,
        )
        .bind(subscription.id.as_uuid())
        .bind(subscription.user_id.as_str())
        .bind(status_to_string(subscription.status))
        .bind(subscription.category.class_category().as_str())
        .bind(party_size_column(subscription.category))
        .bind(subscription.equipment.as_str())
        .bind(credits_column(subscription.credits)?)
        .bind(subscription.ends_at.as_datetime())
        .bind(subscription.created_at.as_datetime())
        .bind(subscription.updated_at.as_datetime())
        .bind(subscription.version)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to save subscription", e))?;

        Ok(())
    }

    async fn compare_and_set(
        &self,
        subscription: &Subscription,
        expected_version: i64,
    ) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE user_subscriptions SET
                status = $3,
                remaining_credits = $4,
                updated_at = $5,
                version = $6
            WHERE id = $1 AND version = $2
            "#,
        )
        .bind(subscription.id.as_uuid())
        .bind(expected_version)
        .bind(status_to_string(subscription.status))
        .bind(credits_column(subscription.credits)?)
        .bind(subscription.updated_at.as_datetime())
        .bind(subscription.version)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to update subscription", e))?;

        if result.rows_affected() == 1 {
            return Ok(true);
        }

        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM user_subscriptions WHERE id = $1)")
                .bind(subscription.id.as_uuid())
                .fetch_one(&self.pool)
                .await
                .map_err(|e| db_error("Failed to check subscription", e))?;

        if exists {
            Ok(false)
        } else {
            Err(DomainError::new(
                ErrorCode::SubscriptionNotFound,
                format!("Subscription not found: {}", subscription.id),
            ))
        }
    }

    async fn add_fallback_credit(&self, user_id: &UserId, amount: u32) -> Result<u32, DomainError> {
        let balance: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO user_credit_balances (user_id, balance, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (user_id) DO UPDATE SET
                balance = user_credit_balances.balance + EXCLUDED.balance,
                updated_at = NOW()
            RETURNING balance
            "#,
        )
        .bind(user_id.as_str())
        .bind(to_db_int("amount", amount)?)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("Failed to credit fallback balance", e))?;

        from_db_int("balance", balance)
    }

    async fn fallback_balance(&self, user_id: &UserId) -> Result<u32, DomainError> {
        let balance: Option<i32> =
            sqlx::query_scalar("SELECT balance FROM user_credit_balances WHERE user_id = $1")
                .bind(user_id.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_error("Failed to read fallback balance", e))?;

        balance.map_or(Ok(0), |b| from_db_int("balance", b))
    }
}
