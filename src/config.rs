use anyhow::Result;
use chrono::Utc;
use model::entities::setting;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Database, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    Set,
};

use crate::schemas::AppState;

/// Human-readable service name reported by the root endpoint.
pub const APP_NAME: &str = "Budget Tracker API";

/// Setting key holding the bearer token expected by the auth layer.
pub const API_KEY_SETTING: &str = "api_key";

/// Initialize application state against the given database URL.
pub async fn initialize_app_state_with_url(database_url: &str) -> Result<AppState> {
    dotenvy::dotenv().ok();

    tracing::info!("Connecting to database: {}", database_url);
    let db = Database::connect(database_url).await?;

    Ok(AppState { db })
}

/// The API key the bearer auth gate compares against.
///
/// Reads the `api_key` setting, seeding it on first use from the
/// `API_KEY` environment variable or a freshly generated UUID.
pub async fn api_key(db: &DatabaseConnection) -> Result<String, DbErr> {
    if let Some(existing) = setting::Entity::find()
        .filter(setting::Column::Key.eq(API_KEY_SETTING))
        .one(db)
        .await?
    {
        return Ok(existing.value);
    }

    let generated =
        std::env::var("API_KEY").unwrap_or_else(|_| uuid::Uuid::new_v4().to_string());
    tracing::info!("seeding api_key setting");

    let seeded = setting::ActiveModel {
        key: Set(API_KEY_SETTING.to_string()),
        value: Set(generated),
        updated_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    Ok(seeded.value)
}
