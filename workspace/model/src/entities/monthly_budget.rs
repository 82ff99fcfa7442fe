use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

/// The budget target for a single calendar month, keyed by a "YYYY-MM"
/// month string. There is no foreign key to transactions; the month's
/// transactions are found by timestamp range.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "monthly_budgets")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Canonical month key in "YYYY-MM" form.
    #[sea_orm(unique)]
    pub month_year: String,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub budget_amount: Decimal,
    /// When set, summaries add the previous month's surplus or deficit
    /// to the effective budget. Defaults to true at the schema level.
    pub rollover_enabled: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
