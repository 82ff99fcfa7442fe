//! Net transaction totals over a timestamp range.

use chrono::{DateTime, Utc};
use model::entities::transaction;
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use tracing::debug;

use crate::error::Result;

/// Signed sum of all transactions with `start <= timestamp < end`:
/// withdrawals count positive, deposits negative. The result is the
/// amount of budget the period consumed.
pub async fn net_total(
    db: &DatabaseConnection,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Decimal> {
    let transactions = transaction::Entity::find()
        .filter(transaction::Column::Timestamp.gte(start))
        .filter(transaction::Column::Timestamp.lt(end))
        .all(db)
        .await?;

    let total: Decimal = transactions.iter().map(|t| t.signed_amount()).sum();
    debug!(%start, %end, count = transactions.len(), %total, "computed net transaction total");
    Ok(total)
}
