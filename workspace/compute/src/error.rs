use thiserror::Error;

/// Error types for the compute crate.
#[derive(Error, Debug)]
pub enum ComputeError {
    /// Error from the database operations
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// A month key that is not of the canonical "YYYY-MM" form.
    #[error("Invalid month key '{0}': expected YYYY-MM")]
    InvalidMonthKey(String),

    /// A summary was requested for a month with no stored budget.
    /// Summaries never create budgets lazily.
    #[error("No budget stored for month '{0}'")]
    BudgetNotFound(String),

    /// A stored setting value that cannot be interpreted.
    #[error("Invalid value '{value}' for setting '{key}'")]
    InvalidSetting { key: String, value: String },
}

/// Type alias for Result with ComputeError
pub type Result<T> = std::result::Result<T, ComputeError>;
