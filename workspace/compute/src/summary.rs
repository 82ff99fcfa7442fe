//! A single month's budget position.

use model::entities::monthly_budget;
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use tracing::{debug, instrument};

use crate::error::{ComputeError, Result};
use crate::month;
use crate::rollover;
use crate::transaction;

/// Totals for one budget month.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetSummary {
    pub month_year: String,
    /// The stored budget amount, without any rollover adjustment.
    pub budget_amount: Decimal,
    /// Signed net total of the month's transactions.
    pub total_transactions: Decimal,
    pub remaining_budget: Decimal,
    pub is_over_budget: bool,
    pub rollover_enabled: bool,
}

/// Summarize the budget month identified by `month_key`.
///
/// Fails with `BudgetNotFound` when no budget row exists; summarizing
/// never creates one. When rollover is enabled the previous month's
/// carry-over is recomputed on every call.
///
/// `remaining_budget` is measured against the stored `budget_amount`;
/// the rollover-adjusted effective budget does not feed into it.
#[instrument(skip(db))]
pub async fn summarize(db: &DatabaseConnection, month_key: &str) -> Result<BudgetSummary> {
    // Validate the key before touching any stored state, so a malformed
    // key never reads as "no budget stored".
    let (start, end) = month::month_bounds(month_key)?;

    let Some(budget) = monthly_budget::Entity::find()
        .filter(monthly_budget::Column::MonthYear.eq(month_key))
        .one(db)
        .await?
    else {
        return Err(ComputeError::BudgetNotFound(month_key.to_string()));
    };

    let mut effective_budget = budget.budget_amount;
    if budget.rollover_enabled {
        effective_budget += rollover::rollover_amount(db, month_key).await?;
    }
    debug!(stored = %budget.budget_amount, %effective_budget, "resolved budget amounts");

    let total = transaction::net_total(db, start.and_utc(), end.and_utc()).await?;

    let remaining = budget.budget_amount - total;
    Ok(BudgetSummary {
        month_year: month_key.to_string(),
        budget_amount: budget.budget_amount,
        total_transactions: total,
        remaining_budget: remaining,
        is_over_budget: remaining < Decimal::ZERO,
        rollover_enabled: budget.rollover_enabled,
    })
}
