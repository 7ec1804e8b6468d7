//! Booking rule configuration

use serde::Deserialize;

use super::error::ValidationError;

const MAX_LEAD_TIME_MINUTES: i64 = 7 * 24 * 60;
const MAX_RETRY_BOUND: u32 = 50;

/// Tunables of the reservation engine.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct BookingRules {
    /// Freed seats are offered to the waitlist only while the class starts
    /// more than this many minutes from now.
    #[serde(default = "default_promotion_lead_time")]
    pub promotion_lead_time_minutes: i64,

    /// Attempts to claim a waitlist position before `WaitlistContention`.
    #[serde(default = "default_attempts")]
    pub waitlist_insert_attempts: u32,

    /// Attempts at a version-checked credit update before `CreditContention`.
    #[serde(default = "default_attempts")]
    pub credit_update_attempts: u32,
}

impl BookingRules {
    pub fn promotion_lead_time(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.promotion_lead_time_minutes)
    }

    /// Validate booking rules
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(0..=MAX_LEAD_TIME_MINUTES).contains(&self.promotion_lead_time_minutes) {
            return Err(ValidationError::InvalidPromotionLeadTime);
        }
        if !(1..=MAX_RETRY_BOUND).contains(&self.waitlist_insert_attempts) {
            return Err(ValidationError::InvalidRetryBound("waitlist_insert_attempts"));
        }
        if !(1..=MAX_RETRY_BOUND).contains(&self.credit_update_attempts) {
            return Err(ValidationError::InvalidRetryBound("credit_update_attempts"));
        }
        Ok(())
    }
}

impl Default for BookingRules {
    fn default() -> Self {
        Self {
            promotion_lead_time_minutes: default_promotion_lead_time(),
            waitlist_insert_attempts: default_attempts(),
            credit_update_attempts: default_attempts(),
        }
    }
}

fn default_promotion_lead_time() -> i64 {
    120
}

fn default_attempts() -> u32 {
    5
}
