use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Duration, FixedOffset, LocalResult, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use model::entities::transaction::{self, TransactionKind};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace, warn};
use utoipa::ToSchema;

use crate::handlers::devices::username_for_device;
use crate::schemas::{AppState, ErrorResponse, MessageResponse, compute_error_response};

/// Request body for recording a transaction
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateTransactionRequest {
    /// Identifier of the device that recorded this transaction
    pub device_id: String,
    /// Short description of the transaction
    pub name: String,
    /// Non-negative amount; direction is carried by `kind`
    #[schema(value_type = String)]
    pub amount: Decimal,
    /// Whether money left (`withdraw`) or entered (`deposit`) the budget
    #[schema(value_type = String)]
    pub kind: TransactionKind,
    /// When the transaction happened, in UTC
    pub timestamp: DateTime<Utc>,
}

/// Request body for updating a transaction; absent fields keep their value
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UpdateTransactionRequest {
    pub name: Option<String>,
    #[schema(value_type = Option<String>)]
    pub amount: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub kind: Option<TransactionKind>,
    pub timestamp: Option<DateTime<Utc>>,
}

/// Query parameters accepted by the transaction list endpoint
#[derive(Debug, Deserialize, ToSchema)]
pub struct TransactionListQuery {
    /// IANA timezone name used to resolve month boundaries and render timestamps
    pub timezone: Option<String>,
    /// Restrict results to a calendar month, `YYYY-MM`
    pub month_year: Option<String>,
}

/// Transaction response model
#[derive(Debug, Serialize, ToSchema)]
pub struct TransactionResponse {
    pub id: i32,
    pub device_id: String,
    pub name: String,
    #[schema(value_type = String)]
    pub amount: Decimal,
    #[schema(value_type = String)]
    pub kind: TransactionKind,
    /// Transaction time rendered in the requested timezone
    #[schema(value_type = String)]
    pub timestamp: DateTime<FixedOffset>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Username registered for the recording device, when known
    pub username: Option<String>,
}

impl TransactionResponse {
    fn from_model(model: transaction::Model, username: Option<String>, tz: Tz) -> Self {
        Self {
            id: model.id,
            device_id: model.device_id,
            name: model.name,
            amount: model.amount,
            kind: model.kind,
            timestamp: model.timestamp.with_timezone(&tz).fixed_offset(),
            created_at: model.created_at,
            updated_at: model.updated_at,
            username,
        }
    }
}

fn bad_request(code: &str, message: String) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message,
            code: code.to_string(),
            success: false,
        }),
    )
}

fn internal_error(db_error: sea_orm::DbErr) -> (StatusCode, Json<ErrorResponse>) {
    error!("transaction database error: {}", db_error);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: "Internal server error".to_string(),
            code: "DATABASE_ERROR".to_string(),
            success: false,
        }),
    )
}

fn not_found(message: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: message.to_string(),
            code: "TRANSACTION_NOT_FOUND".to_string(),
            success: false,
        }),
    )
}

/// Resolve an optional IANA timezone name, defaulting to UTC.
fn parse_timezone(name: Option<&str>) -> Result<Tz, (StatusCode, Json<ErrorResponse>)> {
    match name {
        None => Ok(Tz::UTC),
        Some(name) => name.parse::<Tz>().map_err(|_| {
            warn!("rejected unknown timezone: {}", name);
            bad_request(
                "UNKNOWN_TIMEZONE",
                format!("Unknown timezone '{name}': expected an IANA name like Europe/Prague"),
            )
        }),
    }
}

/// A wall-clock boundary interpreted in `tz`. Ambiguous local times (DST
/// fold) resolve to the earlier instant; local times skipped by a DST gap
/// resolve to the first valid local time after the gap.
fn localize_bound(tz: Tz, naive: NaiveDateTime) -> DateTime<Utc> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        // DST gaps are at most a few hours wide; probe past the gap and
        // take the earliest instant there.
        LocalResult::None => (1..=3)
            .find_map(|hours| {
                tz.from_local_datetime(&(naive + Duration::hours(hours)))
                    .earliest()
            })
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| naive.and_utc()),
    }
}

/// Record a new transaction
#[utoipa::path(
    post,
    path = "/transactions",
    tag = "transactions",
    request_body = CreateTransactionRequest,
    responses(
        (status = 201, description = "Transaction recorded successfully", body = TransactionResponse),
        (status = 400, description = "Negative amount", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn create_transaction(
    State(state): State<AppState>,
    Json(request): Json<CreateTransactionRequest>,
) -> Result<(StatusCode, Json<TransactionResponse>), (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering create_transaction function");
    debug!(
        "Recording {:?} of {} from device '{}'",
        request.kind, request.amount, request.device_id
    );

    if request.amount < Decimal::ZERO {
        warn!("rejected negative amount: {}", request.amount);
        return Err(bad_request(
            "NEGATIVE_AMOUNT",
            "Transaction amount must not be negative".to_string(),
        ));
    }

    let now = Utc::now();
    let new_transaction = transaction::ActiveModel {
        device_id: Set(request.device_id.clone()),
        name: Set(request.name.clone()),
        amount: Set(request.amount),
        kind: Set(request.kind),
        timestamp: Set(request.timestamp),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let inserted = new_transaction.insert(&state.db).await.map_err(internal_error)?;
    let username = username_for_device(&state.db, &inserted.device_id)
        .await
        .map_err(internal_error)?;

    info!(
        "Transaction recorded with ID: {}, device: {}",
        inserted.id, inserted.device_id
    );
    Ok((
        StatusCode::CREATED,
        Json(TransactionResponse::from_model(inserted, username, Tz::UTC)),
    ))
}

/// List transactions, newest first, optionally restricted to one month
#[utoipa::path(
    get,
    path = "/transactions",
    tag = "transactions",
    params(
        ("timezone" = Option<String>, Query, description = "IANA timezone for month boundaries and rendering, defaults to UTC"),
        ("month_year" = Option<String>, Query, description = "Restrict to a calendar month, YYYY-MM"),
    ),
    responses(
        (status = 200, description = "Transactions retrieved successfully", body = Vec<TransactionResponse>),
        (status = 400, description = "Malformed month key or unknown timezone", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_transactions(
    Query(query): Query<TransactionListQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<TransactionResponse>>, (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering get_transactions function");

    let tz = parse_timezone(query.timezone.as_deref())?;

    let mut select = transaction::Entity::find().order_by_desc(transaction::Column::Timestamp);

    if let Some(month_year) = &query.month_year {
        let (start, end) = compute::month::month_bounds(month_year).map_err(compute_error_response)?;
        let start_utc = localize_bound(tz, start);
        let end_utc = localize_bound(tz, end);
        debug!(
            "filtering transactions to [{}, {}) for {} in {}",
            start_utc, end_utc, month_year, tz
        );
        select = select
            .filter(transaction::Column::Timestamp.gte(start_utc))
            .filter(transaction::Column::Timestamp.lt(end_utc));
    }

    let models = select.all(&state.db).await.map_err(internal_error)?;
    debug!("Found {} transactions", models.len());

    let mut responses = Vec::with_capacity(models.len());
    for model in models {
        let username = username_for_device(&state.db, &model.device_id)
            .await
            .map_err(internal_error)?;
        responses.push(TransactionResponse::from_model(model, username, tz));
    }

    Ok(Json(responses))
}

/// Get a transaction by id
#[utoipa::path(
    get,
    path = "/transactions/{transaction_id}",
    tag = "transactions",
    params(
        ("transaction_id" = i32, Path, description = "Transaction ID"),
    ),
    responses(
        (status = 200, description = "Transaction retrieved successfully", body = TransactionResponse),
        (status = 404, description = "Transaction not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_transaction(
    Path(transaction_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<TransactionResponse>, (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering get_transaction for id: {}", transaction_id);

    let Some(model) = transaction::Entity::find_by_id(transaction_id)
        .one(&state.db)
        .await
        .map_err(internal_error)?
    else {
        warn!("Transaction {} not found", transaction_id);
        return Err(not_found("Transaction not found"));
    };

    let username = username_for_device(&state.db, &model.device_id)
        .await
        .map_err(internal_error)?;
    Ok(Json(TransactionResponse::from_model(model, username, Tz::UTC)))
}

/// Get the oldest recorded transaction
#[utoipa::path(
    get,
    path = "/transactions/oldest",
    tag = "transactions",
    responses(
        (status = 200, description = "Oldest transaction retrieved", body = TransactionResponse),
        (status = 404, description = "No transactions recorded", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_oldest_transaction(
    State(state): State<AppState>,
) -> Result<Json<TransactionResponse>, (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering get_oldest_transaction function");

    let Some(model) = transaction::Entity::find()
        .order_by_asc(transaction::Column::Timestamp)
        .one(&state.db)
        .await
        .map_err(internal_error)?
    else {
        return Err(not_found("No transactions recorded"));
    };

    let username = username_for_device(&state.db, &model.device_id)
        .await
        .map_err(internal_error)?;
    Ok(Json(TransactionResponse::from_model(model, username, Tz::UTC)))
}

/// Get the next transaction after the given one, by timestamp
#[utoipa::path(
    get,
    path = "/transactions/next/{transaction_id}",
    tag = "transactions",
    params(
        ("transaction_id" = i32, Path, description = "Transaction ID to step forward from"),
    ),
    responses(
        (status = 200, description = "Next transaction retrieved", body = TransactionResponse),
        (status = 404, description = "No newer transaction", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_next_transaction(
    Path(transaction_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<TransactionResponse>, (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering get_next_transaction for id: {}", transaction_id);

    let Some(current) = transaction::Entity::find_by_id(transaction_id)
        .one(&state.db)
        .await
        .map_err(internal_error)?
    else {
        warn!("Transaction {} not found", transaction_id);
        return Err(not_found("Transaction not found"));
    };

    let Some(next) = transaction::Entity::find()
        .filter(transaction::Column::Timestamp.gt(current.timestamp))
        .order_by_asc(transaction::Column::Timestamp)
        .one(&state.db)
        .await
        .map_err(internal_error)?
    else {
        return Err(not_found("No newer transaction"));
    };

    let username = username_for_device(&state.db, &next.device_id)
        .await
        .map_err(internal_error)?;
    Ok(Json(TransactionResponse::from_model(next, username, Tz::UTC)))
}

/// Get the previous transaction before the given one, by timestamp
#[utoipa::path(
    get,
    path = "/transactions/previous/{transaction_id}",
    tag = "transactions",
    params(
        ("transaction_id" = i32, Path, description = "Transaction ID to step back from"),
    ),
    responses(
        (status = 200, description = "Previous transaction retrieved", body = TransactionResponse),
        (status = 404, description = "No older transaction", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_previous_transaction(
    Path(transaction_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<TransactionResponse>, (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering get_previous_transaction for id: {}", transaction_id);

    let Some(current) = transaction::Entity::find_by_id(transaction_id)
        .one(&state.db)
        .await
        .map_err(internal_error)?
    else {
        warn!("Transaction {} not found", transaction_id);
        return Err(not_found("Transaction not found"));
    };

    let Some(previous) = transaction::Entity::find()
        .filter(transaction::Column::Timestamp.lt(current.timestamp))
        .order_by_desc(transaction::Column::Timestamp)
        .one(&state.db)
        .await
        .map_err(internal_error)?
    else {
        return Err(not_found("No older transaction"));
    };

    let username = username_for_device(&state.db, &previous.device_id)
        .await
        .map_err(internal_error)?;
    Ok(Json(TransactionResponse::from_model(previous, username, Tz::UTC)))
}

/// Update a transaction; only the provided fields change
#[utoipa::path(
    put,
    path = "/transactions/{transaction_id}",
    tag = "transactions",
    params(
        ("transaction_id" = i32, Path, description = "Transaction ID"),
    ),
    request_body = UpdateTransactionRequest,
    responses(
        (status = 200, description = "Transaction updated successfully", body = TransactionResponse),
        (status = 400, description = "Negative amount", body = ErrorResponse),
        (status = 404, description = "Transaction not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn update_transaction(
    Path(transaction_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<UpdateTransactionRequest>,
) -> Result<Json<TransactionResponse>, (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering update_transaction for id: {}", transaction_id);

    if let Some(amount) = request.amount {
        if amount < Decimal::ZERO {
            warn!("rejected negative amount on update: {}", amount);
            return Err(bad_request(
                "NEGATIVE_AMOUNT",
                "Transaction amount must not be negative".to_string(),
            ));
        }
    }

    let Some(existing) = transaction::Entity::find_by_id(transaction_id)
        .one(&state.db)
        .await
        .map_err(internal_error)?
    else {
        warn!("Transaction {} not found for update", transaction_id);
        return Err(not_found("Transaction not found"));
    };

    let mut transaction_active: transaction::ActiveModel = existing.into();
    if let Some(name) = request.name {
        transaction_active.name = Set(name);
    }
    if let Some(amount) = request.amount {
        transaction_active.amount = Set(amount);
    }
    if let Some(kind) = request.kind {
        transaction_active.kind = Set(kind);
    }
    if let Some(timestamp) = request.timestamp {
        transaction_active.timestamp = Set(timestamp);
    }
    transaction_active.updated_at = Set(Utc::now());

    let updated = transaction_active.update(&state.db).await.map_err(internal_error)?;
    let username = username_for_device(&state.db, &updated.device_id)
        .await
        .map_err(internal_error)?;

    info!("Transaction {} updated", transaction_id);
    Ok(Json(TransactionResponse::from_model(updated, username, Tz::UTC)))
}

/// Delete a transaction
#[utoipa::path(
    delete,
    path = "/transactions/{transaction_id}",
    tag = "transactions",
    params(
        ("transaction_id" = i32, Path, description = "Transaction ID"),
    ),
    responses(
        (status = 200, description = "Transaction deleted successfully", body = MessageResponse),
        (status = 404, description = "Transaction not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_transaction(
    Path(transaction_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering delete_transaction for id: {}", transaction_id);

    let result = transaction::Entity::delete_by_id(transaction_id)
        .exec(&state.db)
        .await
        .map_err(internal_error)?;

    if result.rows_affected == 0 {
        warn!("Transaction {} not found for deletion", transaction_id);
        return Err(not_found("Transaction not found"));
    }

    info!("Transaction {} deleted", transaction_id);
    Ok(Json(MessageResponse {
        message: format!("Transaction {transaction_id} deleted"),
    }))
}
