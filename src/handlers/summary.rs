use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{instrument, trace};
use utoipa::ToSchema;

use crate::schemas::{AppState, ErrorResponse, compute_error_response};

/// Budget summary response model
#[derive(Debug, Serialize, ToSchema)]
pub struct BudgetSummaryResponse {
    pub month_year: String,
    #[schema(value_type = String)]
    pub budget_amount: Decimal,
    /// Net spend for the month: withdrawals minus deposits
    #[schema(value_type = String)]
    pub total_transactions: Decimal,
    #[schema(value_type = String)]
    pub remaining_budget: Decimal,
    pub is_over_budget: bool,
    pub rollover_enabled: bool,
}

impl From<compute::BudgetSummary> for BudgetSummaryResponse {
    fn from(summary: compute::BudgetSummary) -> Self {
        Self {
            month_year: summary.month_year,
            budget_amount: summary.budget_amount,
            total_transactions: summary.total_transactions,
            remaining_budget: summary.remaining_budget,
            is_over_budget: summary.is_over_budget,
            rollover_enabled: summary.rollover_enabled,
        }
    }
}

/// Summarize a month's budget against its transactions
#[utoipa::path(
    get,
    path = "/budget-summary/{month_year}",
    tag = "budget-summary",
    params(
        ("month_year" = String, Path, description = "Calendar month, YYYY-MM"),
    ),
    responses(
        (status = 200, description = "Budget summary computed successfully", body = BudgetSummaryResponse),
        (status = 400, description = "Malformed month key", body = ErrorResponse),
        (status = 404, description = "No budget stored for this month", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_budget_summary(
    Path(month_year): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<BudgetSummaryResponse>, (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering get_budget_summary for month: {}", month_year);

    let summary = compute::summarize(&state.db, &month_year)
        .await
        .map_err(compute_error_response)?;
    Ok(Json(BudgetSummaryResponse::from(summary)))
}
