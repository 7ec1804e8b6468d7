//! Class and subscription categories.
//!
//! Group classes are open sessions with an arbitrary capacity. Personal
//! classes are private sessions for a fixed party of one, two or three,
//! and a personal subscription is sold for exactly one of those sizes.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::ValidationError;

/// Category of a scheduled class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassCategory {
    Group,
    Personal,
}

impl ClassCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassCategory::Group => "group",
            ClassCategory::Personal => "personal",
        }
    }
}

impl fmt::Display for ClassCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Party size of a personal session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartySize {
    Solo,
    Duo,
    Trio,
}

impl PartySize {
    /// Number of seats the party occupies.
    pub fn seats(&self) -> u32 {
        match self {
            PartySize::Solo => 1,
            PartySize::Duo => 2,
            PartySize::Trio => 3,
        }
    }

    pub fn from_seats(seats: u32) -> Result<Self, ValidationError> {
        match seats {
            1 => Ok(PartySize::Solo),
            2 => Ok(PartySize::Duo),
            3 => Ok(PartySize::Trio),
            other => Err(ValidationError::out_of_range("party_size", 1, 3, other.into())),
        }
    }
}

/// Category a subscription is sold for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "party", rename_all = "snake_case")]
pub enum SubscriptionCategory {
    Group,
    Personal(PartySize),
}

impl SubscriptionCategory {
    /// Class category this subscription may book.
    pub fn class_category(&self) -> ClassCategory {
        match self {
            SubscriptionCategory::Group => ClassCategory::Group,
            SubscriptionCategory::Personal(_) => ClassCategory::Personal,
        }
    }

    pub fn party_size(&self) -> Option<PartySize> {
        match self {
            SubscriptionCategory::Group => None,
            SubscriptionCategory::Personal(size) => Some(*size),
        }
    }
}

impl fmt::Display for SubscriptionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubscriptionCategory::Group => f.write_str("group"),
            SubscriptionCategory::Personal(size) => write!(f, "personal/{}", size.seats()),
        }
    }
}
