//! Column conversions shared by the PostgreSQL repositories.

use crate::domain::foundation::{DomainError, ErrorCode, UserId};
use crate::domain::studio::Equipment;

pub(super) fn db_error(context: &str, err: sqlx::Error) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, format!("{}: {}", context, err))
}

pub(super) fn corrupt(column: &str, value: impl std::fmt::Display) -> DomainError {
    DomainError::new(
        ErrorCode::DatabaseError,
        format!("Invalid {} value: {}", column, value),
    )
}

/// Name of the violated constraint, if `err` is a constraint violation.
pub(super) fn violated_constraint(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db_err) => db_err.constraint().map(str::to_string),
        _ => None,
    }
}

pub(super) fn parse_equipment(value: &str) -> Result<Equipment, DomainError> {
    value.parse().map_err(|_| corrupt("equipment", value))
}

pub(super) fn parse_user_id(value: String) -> Result<UserId, DomainError> {
    UserId::new(value.clone()).map_err(|_| corrupt("user_id", value))
}

pub(super) fn to_db_int(column: &str, value: u32) -> Result<i32, DomainError> {
    i32::try_from(value).map_err(|_| {
        DomainError::validation(column, format!("{} does not fit the column", value))
    })
}

pub(super) fn from_db_int(column: &str, value: i32) -> Result<u32, DomainError> {
    u32::try_from(value).map_err(|_| corrupt(column, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equipment_round_trips_through_text() {
        for equipment in [Equipment::Mat, Equipment::Reformer, Equipment::Both] {
            assert_eq!(parse_equipment(equipment.as_str()).unwrap(), equipment);
        }
        assert!(parse_equipment("kettlebell").is_err());
    }

    #[test]
    fn negative_counts_are_corrupt() {
        assert_eq!(from_db_int("capacity", 4).unwrap(), 4);
        let err = from_db_int("capacity", -1).unwrap_err();
        assert_eq!(err.code, ErrorCode::DatabaseError);
    }

    #[test]
    fn oversized_values_do_not_fit() {
        assert!(to_db_int("position", u32::MAX).is_err());
        assert_eq!(to_db_int("position", 7).unwrap(), 7);
    }

    #[test]
    fn blank_user_id_is_corrupt() {
        assert!(parse_user_id(String::new()).is_err());
        assert_eq!(parse_user_id("m-1".to_string()).unwrap().as_str(), "m-1");
    }
}
