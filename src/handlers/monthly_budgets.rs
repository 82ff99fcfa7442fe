use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use model::entities::{monthly_budget, transaction};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace, warn};
use utoipa::ToSchema;

use crate::schemas::{AppState, ErrorResponse, MessageResponse, compute_error_response};

/// Request body for creating a monthly budget
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateMonthlyBudgetRequest {
    /// Calendar month this budget applies to, `YYYY-MM`
    pub month_year: String,
    /// Budgeted amount for the month
    #[schema(value_type = String)]
    pub budget_amount: Decimal,
    /// Whether the previous month's surplus carries into summaries.
    /// Defaults to true.
    pub rollover_enabled: Option<bool>,
}

/// Request body for updating a monthly budget; absent fields keep their value
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UpdateMonthlyBudgetRequest {
    #[schema(value_type = Option<String>)]
    pub budget_amount: Option<Decimal>,
    pub rollover_enabled: Option<bool>,
}

/// Monthly budget response model
#[derive(Debug, Serialize, ToSchema)]
pub struct MonthlyBudgetResponse {
    pub id: i32,
    pub month_year: String,
    #[schema(value_type = String)]
    pub budget_amount: Decimal,
    pub rollover_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<monthly_budget::Model> for MonthlyBudgetResponse {
    fn from(model: monthly_budget::Model) -> Self {
        Self {
            id: model.id,
            month_year: model.month_year,
            budget_amount: model.budget_amount,
            rollover_enabled: model.rollover_enabled,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

fn internal_error(db_error: sea_orm::DbErr) -> (StatusCode, Json<ErrorResponse>) {
    error!("monthly budget database error: {}", db_error);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: "Internal server error".to_string(),
            code: "DATABASE_ERROR".to_string(),
            success: false,
        }),
    )
}

/// Create a budget for a month that does not have one yet
#[utoipa::path(
    post,
    path = "/monthly-budgets",
    tag = "monthly-budgets",
    request_body = CreateMonthlyBudgetRequest,
    responses(
        (status = 201, description = "Monthly budget created successfully", body = MonthlyBudgetResponse),
        (status = 400, description = "Malformed month key or budget already exists", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn create_monthly_budget(
    State(state): State<AppState>,
    Json(request): Json<CreateMonthlyBudgetRequest>,
) -> Result<(StatusCode, Json<MonthlyBudgetResponse>), (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering create_monthly_budget function");
    debug!("Creating budget for month: {}", request.month_year);

    compute::month::parse_month_key(&request.month_year).map_err(compute_error_response)?;

    let existing = monthly_budget::Entity::find()
        .filter(monthly_budget::Column::MonthYear.eq(request.month_year.as_str()))
        .one(&state.db)
        .await
        .map_err(internal_error)?;
    if existing.is_some() {
        warn!("Budget for '{}' already exists", request.month_year);
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("monthly_budget '{}' already exists", request.month_year),
                code: "BUDGET_EXISTS".to_string(),
                success: false,
            }),
        ));
    }

    let now = Utc::now();
    let new_budget = monthly_budget::ActiveModel {
        month_year: Set(request.month_year.clone()),
        budget_amount: Set(request.budget_amount),
        rollover_enabled: Set(request.rollover_enabled.unwrap_or(true)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let inserted = new_budget.insert(&state.db).await.map_err(internal_error)?;
    info!(
        "Monthly budget created with ID: {}, month: {}",
        inserted.id, inserted.month_year
    );
    Ok((StatusCode::CREATED, Json(MonthlyBudgetResponse::from(inserted))))
}

/// List all monthly budgets, most recent month first
#[utoipa::path(
    get,
    path = "/monthly-budgets",
    tag = "monthly-budgets",
    responses(
        (status = 200, description = "Monthly budgets retrieved successfully", body = Vec<MonthlyBudgetResponse>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_monthly_budgets(
    State(state): State<AppState>,
) -> Result<Json<Vec<MonthlyBudgetResponse>>, (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering get_monthly_budgets function");

    let budgets = monthly_budget::Entity::find()
        .order_by_desc(monthly_budget::Column::MonthYear)
        .all(&state.db)
        .await
        .map_err(internal_error)?;

    debug!("Found {} monthly budgets", budgets.len());
    Ok(Json(
        budgets.into_iter().map(MonthlyBudgetResponse::from).collect(),
    ))
}

/// Get the budget for a month, creating a default one when absent.
/// The created amount is the default budget plus the previous month's
/// surplus.
#[utoipa::path(
    get,
    path = "/monthly-budgets/{month_year}",
    tag = "monthly-budgets",
    params(
        ("month_year" = String, Path, description = "Calendar month, YYYY-MM"),
    ),
    responses(
        (status = 200, description = "Monthly budget retrieved (or created)", body = MonthlyBudgetResponse),
        (status = 400, description = "Malformed month key", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_monthly_budget(
    Path(month_year): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<MonthlyBudgetResponse>, (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering get_monthly_budget for month: {}", month_year);

    let budget = compute::get_or_create_budget(&state.db, &month_year)
        .await
        .map_err(compute_error_response)?;
    Ok(Json(MonthlyBudgetResponse::from(budget)))
}

/// Update a monthly budget; only the provided fields change
#[utoipa::path(
    put,
    path = "/monthly-budgets/{month_year}",
    tag = "monthly-budgets",
    params(
        ("month_year" = String, Path, description = "Calendar month, YYYY-MM"),
    ),
    request_body = UpdateMonthlyBudgetRequest,
    responses(
        (status = 200, description = "Monthly budget updated successfully", body = MonthlyBudgetResponse),
        (status = 404, description = "Budget not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn update_monthly_budget(
    Path(month_year): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<UpdateMonthlyBudgetRequest>,
) -> Result<Json<MonthlyBudgetResponse>, (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering update_monthly_budget for month: {}", month_year);

    let Some(existing) = monthly_budget::Entity::find()
        .filter(monthly_budget::Column::MonthYear.eq(month_year.as_str()))
        .one(&state.db)
        .await
        .map_err(internal_error)?
    else {
        warn!("Budget '{}' not found for update", month_year);
        return Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("monthly_budget '{month_year}' doesn't exist."),
                code: "BUDGET_NOT_FOUND".to_string(),
                success: false,
            }),
        ));
    };

    let mut budget_active: monthly_budget::ActiveModel = existing.into();
    if let Some(budget_amount) = request.budget_amount {
        budget_active.budget_amount = Set(budget_amount);
    }
    if let Some(rollover_enabled) = request.rollover_enabled {
        budget_active.rollover_enabled = Set(rollover_enabled);
    }
    budget_active.updated_at = Set(Utc::now());

    let updated = budget_active.update(&state.db).await.map_err(internal_error)?;
    info!("Monthly budget '{}' updated", month_year);
    Ok(Json(MonthlyBudgetResponse::from(updated)))
}

/// Delete a monthly budget. Refused while the month still has transactions.
#[utoipa::path(
    delete,
    path = "/monthly-budgets/{month_year}",
    tag = "monthly-budgets",
    params(
        ("month_year" = String, Path, description = "Calendar month, YYYY-MM"),
    ),
    responses(
        (status = 200, description = "Monthly budget deleted successfully", body = MessageResponse),
        (status = 403, description = "Month still has transactions", body = ErrorResponse),
        (status = 404, description = "Budget not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_monthly_budget(
    Path(month_year): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering delete_monthly_budget for month: {}", month_year);

    let Some(existing) = monthly_budget::Entity::find()
        .filter(monthly_budget::Column::MonthYear.eq(month_year.as_str()))
        .one(&state.db)
        .await
        .map_err(internal_error)?
    else {
        warn!("Budget '{}' not found for deletion", month_year);
        return Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("monthly_budget '{month_year}' doesn't exist."),
                code: "BUDGET_NOT_FOUND".to_string(),
                success: false,
            }),
        ));
    };

    let (start, end) = compute::month::month_bounds(&month_year).map_err(compute_error_response)?;
    let transaction_count = transaction::Entity::find()
        .filter(transaction::Column::Timestamp.gte(start.and_utc()))
        .filter(transaction::Column::Timestamp.lt(end.and_utc()))
        .count(&state.db)
        .await
        .map_err(internal_error)?;

    if transaction_count > 0 {
        warn!(
            "Refusing to delete budget '{}': {} transactions in month",
            month_year, transaction_count
        );
        return Err((
            StatusCode::FORBIDDEN,
            Json(ErrorResponse {
                error: format!(
                    "monthly_budget '{month_year}' still has {transaction_count} transactions"
                ),
                code: "BUDGET_IN_USE".to_string(),
                success: false,
            }),
        ));
    }

    existing.delete(&state.db).await.map_err(internal_error)?;
    info!("Monthly budget '{}' deleted", month_year);
    Ok(Json(MessageResponse {
        message: format!("Monthly budget '{month_year}' deleted"),
    }))
}
