use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::device;

/// Direction of a transaction relative to the monthly budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(8))")]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    #[sea_orm(string_value = "withdraw")]
    Withdraw,
    #[sea_orm(string_value = "deposit")]
    Deposit,
}

/// A recorded spend or deposit for a device.
/// Budgets are associated with transactions purely by timestamp range.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// The device that recorded this transaction. Loose reference to
    /// `devices.device_id`, used only for username denormalization.
    pub device_id: String,
    pub name: String,
    /// The absolute value of the transaction; always non-negative.
    /// The direction comes from `kind`.
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub amount: Decimal,
    pub kind: TransactionKind,
    /// The economic date of the transaction, stored in UTC.
    pub timestamp: DateTimeUtc,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl Model {
    /// Signed contribution of this transaction to a period's net total.
    /// Withdrawals consume budget and count positive, deposits give budget
    /// back and count negative.
    pub fn signed_amount(&self) -> Decimal {
        match self.kind {
            TransactionKind::Withdraw => self.amount,
            TransactionKind::Deposit => -self.amount,
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "device::Entity",
        from = "Column::DeviceId",
        to = "device::Column::DeviceId"
    )]
    Device,
}

impl Related<device::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Device.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
