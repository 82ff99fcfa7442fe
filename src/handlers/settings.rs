use std::sync::OnceLock;

use axum::{extract::State, http::StatusCode, response::Json};
use chrono::{DateTime, Utc};
use model::entities::setting;
use regex::Regex;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace, warn};
use utoipa::ToSchema;

use crate::schemas::{AppState, ErrorResponse};

/// Request body for creating or updating a setting
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct SettingRequest {
    pub key: String,
    pub value: String,
}

/// Setting response model
#[derive(Debug, Serialize, ToSchema)]
pub struct SettingResponse {
    pub id: i32,
    pub key: String,
    pub value: String,
    pub updated_at: DateTime<Utc>,
}

impl From<setting::Model> for SettingResponse {
    fn from(model: setting::Model) -> Self {
        Self {
            id: model.id,
            key: model.key,
            value: model.value,
            updated_at: model.updated_at,
        }
    }
}

fn internal_error(db_error: sea_orm::DbErr) -> (StatusCode, Json<ErrorResponse>) {
    error!("settings database error: {}", db_error);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: "Internal server error".to_string(),
            code: "DATABASE_ERROR".to_string(),
            success: false,
        }),
    )
}

/// The default budget amount must look like a price with at most two
/// decimal places.
fn price_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d*\.?\d{0,2}$").unwrap())
}

fn validate_setting_value(key: &str, value: &str) -> Result<(), (StatusCode, Json<ErrorResponse>)> {
    if key == compute::DEFAULT_BUDGET_SETTING
        && (value.is_empty() || !price_pattern().is_match(value))
    {
        warn!("rejected invalid price for '{}': {}", key, value);
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("'{value}' is not a valid price"),
                code: "INVALID_PRICE".to_string(),
                success: false,
            }),
        ));
    }
    Ok(())
}

/// List all settings
#[utoipa::path(
    get,
    path = "/settings",
    tag = "settings",
    responses(
        (status = 200, description = "Settings retrieved successfully", body = Vec<SettingResponse>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_settings(
    State(state): State<AppState>,
) -> Result<Json<Vec<SettingResponse>>, (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering get_settings function");

    let settings = setting::Entity::find()
        .order_by_asc(setting::Column::Key)
        .all(&state.db)
        .await
        .map_err(internal_error)?;

    debug!("Found {} settings", settings.len());
    Ok(Json(settings.into_iter().map(SettingResponse::from).collect()))
}

/// Create a setting, overwriting the value when the key already exists
#[utoipa::path(
    post,
    path = "/settings",
    tag = "settings",
    request_body = SettingRequest,
    responses(
        (status = 201, description = "Setting stored successfully", body = SettingResponse),
        (status = 400, description = "Invalid value for this key", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn create_setting(
    State(state): State<AppState>,
    Json(request): Json<SettingRequest>,
) -> Result<(StatusCode, Json<SettingResponse>), (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering create_setting function");
    debug!("Storing setting '{}'", request.key);

    validate_setting_value(&request.key, &request.value)?;

    let existing = setting::Entity::find()
        .filter(setting::Column::Key.eq(request.key.as_str()))
        .one(&state.db)
        .await
        .map_err(internal_error)?;

    if let Some(existing) = existing {
        let mut setting_active: setting::ActiveModel = existing.into();
        setting_active.value = Set(request.value.clone());
        setting_active.updated_at = Set(Utc::now());

        let updated = setting_active.update(&state.db).await.map_err(internal_error)?;
        info!("Setting '{}' overwritten", updated.key);
        return Ok((StatusCode::CREATED, Json(SettingResponse::from(updated))));
    }

    let new_setting = setting::ActiveModel {
        key: Set(request.key.clone()),
        value: Set(request.value.clone()),
        updated_at: Set(Utc::now()),
        ..Default::default()
    };

    let inserted = new_setting.insert(&state.db).await.map_err(internal_error)?;
    info!("Setting '{}' created with ID: {}", inserted.key, inserted.id);
    Ok((StatusCode::CREATED, Json(SettingResponse::from(inserted))))
}

/// Update an existing setting
#[utoipa::path(
    put,
    path = "/settings",
    tag = "settings",
    request_body = SettingRequest,
    responses(
        (status = 200, description = "Setting updated successfully", body = SettingResponse),
        (status = 400, description = "Invalid value for this key", body = ErrorResponse),
        (status = 404, description = "Setting not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn update_setting(
    State(state): State<AppState>,
    Json(request): Json<SettingRequest>,
) -> Result<Json<SettingResponse>, (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering update_setting function");

    validate_setting_value(&request.key, &request.value)?;

    let Some(existing) = setting::Entity::find()
        .filter(setting::Column::Key.eq(request.key.as_str()))
        .one(&state.db)
        .await
        .map_err(internal_error)?
    else {
        warn!("Setting '{}' not found for update", request.key);
        return Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Setting '{}' doesn't exist", request.key),
                code: "SETTING_NOT_FOUND".to_string(),
                success: false,
            }),
        ));
    };

    let mut setting_active: setting::ActiveModel = existing.into();
    setting_active.value = Set(request.value.clone());
    setting_active.updated_at = Set(Utc::now());

    let updated = setting_active.update(&state.db).await.map_err(internal_error)?;
    info!("Setting '{}' updated", updated.key);
    Ok(Json(SettingResponse::from(updated)))
}
