//! Equipment requirements and access levels.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// Apparatus a class runs on, or that a subscription grants access to.
///
/// As a class requirement, `Both` means the class uses mats and reformers.
/// As an access level, `Both` dominates every requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Equipment {
    Mat,
    Reformer,
    Both,
}

impl Equipment {
    /// Returns true if holding `self` access is enough for `required`.
    pub fn satisfies(&self, required: Equipment) -> bool {
        *self == Equipment::Both || *self == required
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Equipment::Mat => "mat",
            Equipment::Reformer => "reformer",
            Equipment::Both => "both",
        }
    }
}

impl fmt::Display for Equipment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Equipment {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mat" => Ok(Equipment::Mat),
            "reformer" => Ok(Equipment::Reformer),
            "both" => Ok(Equipment::Both),
            other => Err(ValidationError::invalid_format(
                "equipment",
                format!("unknown equipment '{}'", other),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_access_satisfies_everything() {
        for required in [Equipment::Mat, Equipment::Reformer, Equipment::Both] {
            assert!(Equipment::Both.satisfies(required));
        }
    }

    #[test]
    fn single_access_requires_exact_match() {
        assert!(Equipment::Mat.satisfies(Equipment::Mat));
        assert!(!Equipment::Mat.satisfies(Equipment::Reformer));
        assert!(!Equipment::Reformer.satisfies(Equipment::Both));
    }

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("Reformer".parse::<Equipment>().unwrap(), Equipment::Reformer);
        assert!("trapeze".parse::<Equipment>().is_err());
    }
}
