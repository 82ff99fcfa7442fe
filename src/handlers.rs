pub mod devices;
pub mod health;
pub mod monthly_budgets;
pub mod settings;
pub mod summary;
pub mod transactions;
