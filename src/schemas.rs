use axum::{http::StatusCode, response::Json};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use tracing::{error, warn};
use utoipa::{OpenApi, ToSchema};

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
}

/// Error response
#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
}

/// Plain confirmation message, used by delete endpoints.
#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Health check response
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

/// Service identity returned by the public root endpoint.
#[derive(Serialize, ToSchema)]
pub struct AppInfoResponse {
    pub name: String,
    pub version: String,
}

/// Map a compute error onto an HTTP status and error body.
pub fn compute_error_response(err: compute::ComputeError) -> (StatusCode, Json<ErrorResponse>) {
    use compute::ComputeError;

    let (status, code, message) = match &err {
        ComputeError::InvalidMonthKey(key) => {
            warn!("rejected malformed month key: {}", key);
            (
                StatusCode::BAD_REQUEST,
                "INVALID_MONTH_KEY",
                format!("Invalid month key '{key}': expected YYYY-MM"),
            )
        }
        ComputeError::BudgetNotFound(month) => (
            StatusCode::NOT_FOUND,
            "BUDGET_NOT_FOUND",
            format!("monthly_budget '{month}' doesn't exist."),
        ),
        ComputeError::InvalidSetting { key, .. } => {
            error!("stored setting '{}' is unusable: {}", key, err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INVALID_SETTING",
                format!("Stored setting '{key}' has an invalid value"),
            )
        }
        ComputeError::Database(db_error) => {
            error!("database error in compute call: {}", db_error);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR",
                "Internal server error".to_string(),
            )
        }
    };

    (
        status,
        Json(ErrorResponse {
            error: message,
            code: code.to_string(),
            success: false,
        }),
    )
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::app_info,
        crate::handlers::health::health_check,
        crate::handlers::transactions::create_transaction,
        crate::handlers::transactions::get_transactions,
        crate::handlers::transactions::get_transaction,
        crate::handlers::transactions::get_oldest_transaction,
        crate::handlers::transactions::get_next_transaction,
        crate::handlers::transactions::get_previous_transaction,
        crate::handlers::transactions::update_transaction,
        crate::handlers::transactions::delete_transaction,
        crate::handlers::devices::create_device,
        crate::handlers::devices::get_device,
        crate::handlers::devices::update_device_username,
        crate::handlers::monthly_budgets::create_monthly_budget,
        crate::handlers::monthly_budgets::get_monthly_budgets,
        crate::handlers::monthly_budgets::get_monthly_budget,
        crate::handlers::monthly_budgets::update_monthly_budget,
        crate::handlers::monthly_budgets::delete_monthly_budget,
        crate::handlers::settings::get_settings,
        crate::handlers::settings::create_setting,
        crate::handlers::settings::update_setting,
        crate::handlers::summary::get_budget_summary,
    ),
    components(
        schemas(
            ErrorResponse,
            MessageResponse,
            HealthResponse,
            AppInfoResponse,
            crate::handlers::transactions::CreateTransactionRequest,
            crate::handlers::transactions::UpdateTransactionRequest,
            crate::handlers::transactions::TransactionResponse,
            crate::handlers::devices::CreateDeviceRequest,
            crate::handlers::devices::DeviceResponse,
            crate::handlers::monthly_budgets::CreateMonthlyBudgetRequest,
            crate::handlers::monthly_budgets::UpdateMonthlyBudgetRequest,
            crate::handlers::monthly_budgets::MonthlyBudgetResponse,
            crate::handlers::settings::SettingRequest,
            crate::handlers::settings::SettingResponse,
            crate::handlers::summary::BudgetSummaryResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "transactions", description = "Transaction recording and lookup"),
        (name = "devices", description = "Device registry"),
        (name = "monthly-budgets", description = "Per-month budget targets"),
        (name = "settings", description = "Key-value settings store"),
        (name = "budget-summary", description = "Monthly budget summaries"),
    ),
    info(
        title = "Budget Tracker API",
        description = "Personal budget-tracking backend: per-device transactions, monthly budget targets with rollover, and a key-value settings store",
        version = "0.1.0",
    )
)]
pub struct ApiDoc;
