//! Lazy creation of monthly budgets.

use std::str::FromStr;

use chrono::Utc;
use model::entities::{monthly_budget, setting};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use tracing::{debug, info, instrument};

use crate::error::{ComputeError, Result};
use crate::month;
use crate::rollover;

/// Setting key that overrides the compiled-in default budget.
pub const DEFAULT_BUDGET_SETTING: &str = "default_budget_amount";

/// Budget used for lazily created months when no override setting exists.
pub const DEFAULT_BUDGET_AMOUNT: Decimal = Decimal::ONE_THOUSAND;

/// The default budget for new months: the `default_budget_amount`
/// setting when present, otherwise the compiled-in default.
pub async fn default_budget_amount(db: &DatabaseConnection) -> Result<Decimal> {
    let setting = setting::Entity::find()
        .filter(setting::Column::Key.eq(DEFAULT_BUDGET_SETTING))
        .one(db)
        .await?;

    match setting {
        Some(row) => Decimal::from_str(row.value.trim()).map_err(|_| {
            ComputeError::InvalidSetting {
                key: DEFAULT_BUDGET_SETTING.to_string(),
                value: row.value,
            }
        }),
        None => Ok(DEFAULT_BUDGET_AMOUNT),
    }
}

/// Fetch the budget row for `month_key`, creating it when absent.
///
/// A new row starts from the default budget amount plus the rollover
/// from the previous month, with rollover enabled. This is the only
/// place where a rollover is baked into a stored budget_amount; later
/// summaries still recompute rollover on top while the flag stays set.
#[instrument(skip(db))]
pub async fn get_or_create_budget(
    db: &DatabaseConnection,
    month_key: &str,
) -> Result<monthly_budget::Model> {
    month::parse_month_key(month_key)?;

    if let Some(existing) = monthly_budget::Entity::find()
        .filter(monthly_budget::Column::MonthYear.eq(month_key))
        .one(db)
        .await?
    {
        debug!(id = existing.id, "budget already exists");
        return Ok(existing);
    }

    let default = default_budget_amount(db).await?;
    let carried = rollover::rollover_amount(db, month_key).await?;
    let now = Utc::now();

    let created = monthly_budget::ActiveModel {
        month_year: Set(month_key.to_string()),
        budget_amount: Set(default + carried),
        rollover_enabled: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(id = created.id, amount = %created.budget_amount, "created monthly budget");
    Ok(created)
}
