//! Subscription domain module.
//!
//! Credit-bearing subscriptions and the selection rule the ledger uses to
//! decide which one to charge or refund.

mod aggregate;

pub use aggregate::{
    select_active, CreditAllowance, CreditError, Deduction, Subscription, SubscriptionStatus,
};
