//! Budget rollover between consecutive months.

use model::entities::monthly_budget;
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use tracing::{debug, instrument};

use crate::error::Result;
use crate::month;
use crate::transaction;

/// Carry-over from the month preceding `month_key`: the previous month's
/// budget amount minus its net transaction total. Positive means the
/// prior month was underspent and the surplus carries forward; negative
/// means it was overspent and reduces the current budget.
///
/// A missing previous budget is not an error; there is simply nothing to
/// roll over. The result is never persisted or cached, so it always
/// reflects the current transaction state even when past transactions
/// are edited after the fact.
#[instrument(skip(db))]
pub async fn rollover_amount(db: &DatabaseConnection, month_key: &str) -> Result<Decimal> {
    let prev = month::previous_month(month_key)?;

    let Some(prev_budget) = monthly_budget::Entity::find()
        .filter(monthly_budget::Column::MonthYear.eq(prev.as_str()))
        .one(db)
        .await?
    else {
        debug!(%prev, "no previous budget, rollover is zero");
        return Ok(Decimal::ZERO);
    };

    let (start, end) = month::month_bounds(&prev)?;
    let prev_net = transaction::net_total(db, start.and_utc(), end.and_utc()).await?;

    let rollover = prev_budget.budget_amount - prev_net;
    debug!(%prev, budget = %prev_budget.budget_amount, %prev_net, %rollover, "computed rollover");
    Ok(rollover)
}
