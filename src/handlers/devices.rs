use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use model::entities::device;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace, warn};
use utoipa::ToSchema;

use crate::schemas::{AppState, ErrorResponse};

/// Request body for registering (or re-registering) a device
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateDeviceRequest {
    /// Client-chosen device identifier
    pub device_id: String,
    /// Display username shown on this device's transactions
    pub username: String,
    /// Human-readable device name
    pub device_name: String,
}

/// Query parameters for renaming a device's user
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateDeviceUsernameQuery {
    /// The new username (must be unique across devices)
    pub username: String,
}

/// Device response model
#[derive(Debug, Serialize, ToSchema)]
pub struct DeviceResponse {
    pub id: i32,
    pub device_id: String,
    pub username: String,
    pub device_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<device::Model> for DeviceResponse {
    fn from(model: device::Model) -> Self {
        Self {
            id: model.id,
            device_id: model.device_id,
            username: model.username,
            device_name: model.device_name,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

fn internal_error(db_error: DbErr) -> (StatusCode, Json<ErrorResponse>) {
    error!("device database error: {}", db_error);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: "Internal server error".to_string(),
            code: "DATABASE_ERROR".to_string(),
            success: false,
        }),
    )
}

fn not_found(device_id: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: format!("Device '{device_id}' not found"),
            code: "DEVICE_NOT_FOUND".to_string(),
            success: false,
        }),
    )
}

/// Display username for a device id, if the device is registered.
pub(crate) async fn username_for_device(
    db: &DatabaseConnection,
    device_id: &str,
) -> Result<Option<String>, DbErr> {
    Ok(device::Entity::find()
        .filter(device::Column::DeviceId.eq(device_id))
        .one(db)
        .await?
        .map(|d| d.username))
}

/// Register a device, updating it in place when the device id is known
#[utoipa::path(
    post,
    path = "/devices",
    tag = "devices",
    request_body = CreateDeviceRequest,
    responses(
        (status = 201, description = "Device registered successfully", body = DeviceResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_device(
    State(state): State<AppState>,
    Json(request): Json<CreateDeviceRequest>,
) -> Result<(StatusCode, Json<DeviceResponse>), (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering create_device function");
    debug!("Registering device with id: {}", request.device_id);

    let existing = device::Entity::find()
        .filter(device::Column::DeviceId.eq(request.device_id.as_str()))
        .one(&state.db)
        .await
        .map_err(internal_error)?;

    if let Some(existing) = existing {
        debug!("Device '{}' already registered, updating", request.device_id);
        let mut device_active: device::ActiveModel = existing.into();
        device_active.username = Set(request.username.clone());
        device_active.device_name = Set(request.device_name.clone());
        device_active.updated_at = Set(Utc::now());

        let updated = device_active.update(&state.db).await.map_err(internal_error)?;

        info!("Device '{}' re-registered", updated.device_id);
        return Ok((StatusCode::CREATED, Json(DeviceResponse::from(updated))));
    }

    let now = Utc::now();
    let new_device = device::ActiveModel {
        device_id: Set(request.device_id.clone()),
        username: Set(request.username.clone()),
        device_name: Set(request.device_name.clone()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let device_model = new_device.insert(&state.db).await.map_err(internal_error)?;
    info!(
        "Device registered with ID: {}, device_id: {}",
        device_model.id, device_model.device_id
    );
    Ok((StatusCode::CREATED, Json(DeviceResponse::from(device_model))))
}

/// Get a device by its device id
#[utoipa::path(
    get,
    path = "/devices/{device_id}",
    tag = "devices",
    params(
        ("device_id" = String, Path, description = "Device identifier"),
    ),
    responses(
        (status = 200, description = "Device retrieved successfully", body = DeviceResponse),
        (status = 404, description = "Device not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_device(
    Path(device_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<DeviceResponse>, (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering get_device function for device_id: {}", device_id);

    let Some(device_model) = device::Entity::find()
        .filter(device::Column::DeviceId.eq(device_id.as_str()))
        .one(&state.db)
        .await
        .map_err(internal_error)?
    else {
        warn!("Device '{}' not found", device_id);
        return Err(not_found(&device_id));
    };

    debug!("Found device '{}'", device_id);
    Ok(Json(DeviceResponse::from(device_model)))
}

/// Rename the user shown for a device
#[utoipa::path(
    put,
    path = "/devices/{device_id}",
    tag = "devices",
    params(
        ("device_id" = String, Path, description = "Device identifier"),
        ("username" = String, Query, description = "New username, unique across devices"),
    ),
    responses(
        (status = 200, description = "Device username updated", body = DeviceResponse),
        (status = 404, description = "Device not found", body = ErrorResponse),
        (status = 409, description = "Username already taken", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_device_username(
    Path(device_id): Path<String>,
    Query(query): Query<UpdateDeviceUsernameQuery>,
    State(state): State<AppState>,
) -> Result<Json<DeviceResponse>, (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering update_device_username for device_id: {}", device_id);

    let Some(existing) = device::Entity::find()
        .filter(device::Column::DeviceId.eq(device_id.as_str()))
        .one(&state.db)
        .await
        .map_err(internal_error)?
    else {
        warn!("Device '{}' not found for username update", device_id);
        return Err(not_found(&device_id));
    };

    let username_taken = device::Entity::find()
        .filter(device::Column::Username.eq(query.username.as_str()))
        .filter(device::Column::DeviceId.ne(device_id.as_str()))
        .one(&state.db)
        .await
        .map_err(internal_error)?
        .is_some();
    if username_taken {
        warn!("Username '{}' already taken", query.username);
        return Err((
            StatusCode::CONFLICT,
            Json(ErrorResponse {
                error: format!("Username '{}' already exists", query.username),
                code: "USERNAME_ALREADY_EXISTS".to_string(),
                success: false,
            }),
        ));
    }

    let mut device_active: device::ActiveModel = existing.into();
    device_active.username = Set(query.username.clone());
    device_active.updated_at = Set(Utc::now());

    let updated = device_active.update(&state.db).await.map_err(internal_error)?;
    info!("Device '{}' renamed to user '{}'", device_id, updated.username);
    Ok(Json(DeviceResponse::from(updated)))
}
