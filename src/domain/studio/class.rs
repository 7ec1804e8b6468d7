//! Scheduled studio class entity.
//!
//! Classes are owned by the scheduling side of the studio; the reservation
//! engine only reads them. Construction still validates the shape so that
//! test fixtures and adapters cannot produce a class the engine would
//! misinterpret.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ClassId, InstructorId, StateMachine, Timestamp, ValidationError};

use super::{ClassCategory, Equipment};

/// Largest capacity accepted for a group class.
pub const MAX_GROUP_CAPACITY: u32 = 500;

/// Lifecycle status of a class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassStatus {
    Active,
    Cancelled,
}

impl StateMachine for ClassStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        matches!((self, target), (ClassStatus::Active, ClassStatus::Cancelled))
    }

    fn valid_transitions(&self) -> Vec<Self> {
        match self {
            ClassStatus::Active => vec![ClassStatus::Cancelled],
            ClassStatus::Cancelled => vec![],
        }
    }
}

/// A scheduled class.
///
/// # Invariants
///
/// - `capacity >= 1`
/// - personal classes have capacity 1, 2 or 3
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudioClass {
    pub id: ClassId,
    pub name: String,
    pub starts_at: Timestamp,
    pub duration_minutes: u32,
    pub capacity: u32,
    pub category: ClassCategory,
    pub equipment: Equipment,
    pub instructor_id: InstructorId,
    pub status: ClassStatus,
}

/// Minimal display fields carried by notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDisplay {
    pub class_name: String,
    pub date: String,
    pub time: String,
}

impl StudioClass {
    /// Schedules a new active class.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for an empty name, a zero duration or a
    /// capacity outside the range allowed for the category.
    #[allow(clippy::too_many_arguments)]
    pub fn schedule(
        id: ClassId,
        name: impl Into<String>,
        starts_at: Timestamp,
        duration_minutes: u32,
        capacity: u32,
        category: ClassCategory,
        equipment: Equipment,
        instructor_id: InstructorId,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::empty_field("name"));
        }
        if duration_minutes == 0 {
            return Err(ValidationError::out_of_range("duration_minutes", 1, 24 * 60, 0));
        }

        let max = match category {
            ClassCategory::Group => MAX_GROUP_CAPACITY,
            ClassCategory::Personal => 3,
        };
        if capacity == 0 || capacity > max {
            return Err(ValidationError::out_of_range(
                "capacity",
                1,
                max.into(),
                capacity.into(),
            ));
        }

        Ok(Self {
            id,
            name,
            starts_at,
            duration_minutes,
            capacity,
            category,
            equipment,
            instructor_id,
            status: ClassStatus::Active,
        })
    }

    /// Whether new reservations may be taken.
    pub fn is_bookable(&self) -> bool {
        self.status == ClassStatus::Active
    }

    /// Whether a freed seat may still be offered to the waitlist.
    ///
    /// Promotions stop once the class is within `lead` of its start.
    pub fn accepts_promotions(&self, now: Timestamp, lead: Duration) -> bool {
        self.starts_at.duration_since(&now) > lead
    }

    /// Marks the class cancelled by the studio.
    ///
    /// # Errors
    ///
    /// Returns error if the class is already cancelled.
    pub fn cancel(&mut self) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(ClassStatus::Cancelled)?;
        Ok(())
    }

    pub fn display(&self) -> ClassDisplay {
        ClassDisplay {
            class_name: self.name.clone(),
            date: self.starts_at.date_label(),
            time: self.starts_at.time_label(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group_class(capacity: u32, starts_in_hours: i64) -> Result<StudioClass, ValidationError> {
        StudioClass::schedule(
            ClassId::new(),
            "Morning Flow",
            Timestamp::now().plus_hours(starts_in_hours),
            50,
            capacity,
            ClassCategory::Group,
            Equipment::Mat,
            InstructorId::new(),
        )
    }

    #[test]
    fn schedule_starts_active() {
        let class = group_class(10, 24).unwrap();
        assert_eq!(class.status, ClassStatus::Active);
        assert!(class.is_bookable());
    }

    #[test]
    fn zero_capacity_is_rejected() {
        assert!(group_class(0, 24).is_err());
    }

    #[test]
    fn personal_capacity_is_limited_to_trio() {
        let result = StudioClass::schedule(
            ClassId::new(),
            "Private Reformer",
            Timestamp::now().add_days(1),
            55,
            4,
            ClassCategory::Personal,
            Equipment::Reformer,
            InstructorId::new(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn blank_name_is_rejected() {
        let result = StudioClass::schedule(
            ClassId::new(),
            " ",
            Timestamp::now(),
            50,
            5,
            ClassCategory::Group,
            Equipment::Mat,
            InstructorId::new(),
        );
        assert!(matches!(result, Err(ValidationError::EmptyField { .. })));
    }

    #[test]
    fn promotions_close_inside_lead_time() {
        let lead = Duration::hours(2);
        let now = Timestamp::now();

        let tomorrow = group_class(5, 24).unwrap();
        assert!(tomorrow.accepts_promotions(now, lead));

        let soon = group_class(5, 1).unwrap();
        assert!(!soon.accepts_promotions(now, lead));
    }

    #[test]
    fn cancelled_class_is_not_bookable() {
        let mut class = group_class(5, 24).unwrap();
        class.cancel().unwrap();
        assert!(!class.is_bookable());
        assert!(class.cancel().is_err());
    }

    #[test]
    fn display_uses_start_time() {
        let class = group_class(5, 24).unwrap();
        let display = class.display();
        assert_eq!(display.class_name, "Morning Flow");
        assert_eq!(display.date, class.starts_at.date_label());
        assert_eq!(display.time, class.starts_at.time_label());
    }
}
