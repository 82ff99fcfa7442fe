//! Core budget arithmetic: month-key handling, rollover between months,
//! and per-month budget summaries. Everything here is a pure function of
//! the stored state behind the injected database connection; nothing is
//! cached across calls.

pub mod budget;
pub mod error;
pub mod month;
pub mod rollover;
pub mod summary;
pub mod transaction;

pub use budget::{
    default_budget_amount, get_or_create_budget, DEFAULT_BUDGET_AMOUNT, DEFAULT_BUDGET_SETTING,
};
pub use error::{ComputeError, Result};
pub use rollover::rollover_amount;
pub use summary::{summarize, BudgetSummary};
