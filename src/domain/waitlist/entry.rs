//! Waitlist entry and the dense renumbering rule.
//!
//! Positions for a class are always exactly `1..=N`. Whenever an entry is
//! removed the survivors are renumbered in their existing order. Changes
//! are planned in ascending position order: every entry only ever moves to
//! a smaller position, so applying the plan front to back never collides
//! with the `(class, position)` uniqueness the stores enforce.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ClassId, Timestamp, UserId, ValidationError, WaitlistEntryId};

/// A user queued for a full class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitlistEntry {
    pub id: WaitlistEntryId,
    pub user_id: UserId,
    pub class_id: ClassId,
    pub position: u32,
    pub created_at: Timestamp,
}

impl WaitlistEntry {
    /// Creates an entry at the given position.
    ///
    /// # Errors
    ///
    /// Returns error if `position` is zero.
    pub fn enqueue(
        id: WaitlistEntryId,
        user_id: UserId,
        class_id: ClassId,
        position: u32,
    ) -> Result<Self, ValidationError> {
        if position == 0 {
            return Err(ValidationError::out_of_range("position", 1, i64::from(u32::MAX), 0));
        }
        Ok(Self {
            id,
            user_id,
            class_id,
            position,
            created_at: Timestamp::now(),
        })
    }

    /// Whether this entry is next in line for a freed seat.
    pub fn is_head(&self) -> bool {
        self.position == 1
    }
}

/// Position a new entry takes given the current maximum.
pub fn next_position(current_max: Option<u32>) -> u32 {
    current_max.map_or(1, |max| max.saturating_add(1))
}

/// A position reassignment produced by [`plan_renumber`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionChange {
    pub entry_id: WaitlistEntryId,
    pub user_id: UserId,
    pub from: u32,
    pub to: u32,
}

/// Plans the dense renumbering of one class's remaining entries.
///
/// Entries are ordered by current position (creation time breaks ties).
/// Only entries whose position changes are returned, in the order they
/// must be applied.
pub fn plan_renumber(entries: &[WaitlistEntry]) -> Vec<PositionChange> {
    let mut ordered: Vec<&WaitlistEntry> = entries.iter().collect();
    ordered.sort_by(|a, b| {
        a.position
            .cmp(&b.position)
            .then_with(|| a.created_at.cmp(&b.created_at))
            .then_with(|| a.id.cmp(&b.id))
    });

    ordered
        .into_iter()
        .zip(1u32..)
        .filter(|(entry, target)| entry.position != *target)
        .map(|(entry, target)| PositionChange {
            entry_id: entry.id,
            user_id: entry.user_id.clone(),
            from: entry.position,
            to: target,
        })
        .collect()
}

/// Whether positions are exactly `1..=N`.
pub fn is_dense(entries: &[WaitlistEntry]) -> bool {
    let mut positions: Vec<u32> = entries.iter().map(|e| e.position).collect();
    positions.sort_unstable();
    positions.iter().zip(1u32..).all(|(p, expected)| *p == expected)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(user: &str, class_id: ClassId, position: u32) -> WaitlistEntry {
        WaitlistEntry::enqueue(
            WaitlistEntryId::new(),
            UserId::new(user).unwrap(),
            class_id,
            position,
        )
        .unwrap()
    }

    #[test]
    fn zero_position_is_rejected() {
        let result = WaitlistEntry::enqueue(
            WaitlistEntryId::new(),
            UserId::new("member-1").unwrap(),
            ClassId::new(),
            0,
        );
        assert!(result.is_err());
    }

    #[test]
    fn next_position_starts_at_one() {
        assert_eq!(next_position(None), 1);
        assert_eq!(next_position(Some(4)), 5);
    }

    #[test]
    fn dense_list_needs_no_changes() {
        let class = ClassId::new();
        let entries = vec![entry("a", class, 1), entry("b", class, 2)];
        assert!(plan_renumber(&entries).is_empty());
        assert!(is_dense(&entries));
    }

    #[test]
    fn gap_after_head_removal_shifts_everyone() {
        let class = ClassId::new();
        let entries = vec![entry("c", class, 3), entry("b", class, 2), entry("d", class, 4)];

        let plan = plan_renumber(&entries);
        let moves: Vec<(u32, u32)> = plan.iter().map(|c| (c.from, c.to)).collect();
        assert_eq!(moves, vec![(2, 1), (3, 2), (4, 3)]);
        assert_eq!(plan[0].user_id.as_str(), "b");
    }

    #[test]
    fn gap_in_middle_only_moves_tail() {
        let class = ClassId::new();
        let entries = vec![entry("a", class, 1), entry("c", class, 3), entry("d", class, 4)];

        let plan = plan_renumber(&entries);
        let moves: Vec<(u32, u32)> = plan.iter().map(|c| (c.from, c.to)).collect();
        assert_eq!(moves, vec![(3, 2), (4, 3)]);
        assert!(!is_dense(&entries));
    }

    #[test]
    fn plan_never_moves_backwards() {
        let class = ClassId::new();
        let entries = vec![entry("a", class, 7), entry("b", class, 2), entry("c", class, 9)];
        for change in plan_renumber(&entries) {
            assert!(change.to < change.from);
        }
    }

    #[test]
    fn head_is_position_one() {
        let class = ClassId::new();
        assert!(entry("a", class, 1).is_head());
        assert!(!entry("b", class, 2).is_head());
    }
}
