//! This file serves as the root for all SeaORM entity modules.
//! The data models for the budget tracking backend live here: recorded
//! transactions, per-month budget targets, the key-value settings store
//! and the device registry.

pub mod device;
pub mod monthly_budget;
pub mod setting;
pub mod transaction;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::device::Entity as Device;
    pub use super::monthly_budget::Entity as MonthlyBudget;
    pub use super::setting::Entity as Setting;
    pub use super::transaction::Entity as Transaction;
}
