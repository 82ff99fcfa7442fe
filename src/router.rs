use crate::auth::require_api_key;
use crate::handlers::{
    devices::{create_device, get_device, update_device_username},
    health::{app_info, health_check},
    monthly_budgets::{
        create_monthly_budget, delete_monthly_budget, get_monthly_budget, get_monthly_budgets,
        update_monthly_budget,
    },
    settings::{create_setting, get_settings, update_setting},
    summary::get_budget_summary,
    transactions::{
        create_transaction, delete_transaction, get_next_transaction, get_oldest_transaction,
        get_previous_transaction, get_transaction, get_transactions, update_transaction,
    },
};
use crate::schemas::{ApiDoc, AppState};
use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create application router with all routes and middleware.
/// Everything except `/` and `/health` requires the API key.
pub fn create_router(state: AppState) -> Router {
    // Literal segments are registered before `:transaction_id` so that
    // `/transactions/oldest` does not parse as an id.
    let protected = Router::new()
        // Transaction routes
        .route("/transactions", post(create_transaction))
        .route("/transactions", get(get_transactions))
        .route("/transactions/oldest", get(get_oldest_transaction))
        .route("/transactions/next/:transaction_id", get(get_next_transaction))
        .route(
            "/transactions/previous/:transaction_id",
            get(get_previous_transaction),
        )
        .route("/transactions/:transaction_id", get(get_transaction))
        .route("/transactions/:transaction_id", put(update_transaction))
        .route("/transactions/:transaction_id", delete(delete_transaction))
        // Device routes
        .route("/devices", post(create_device))
        .route("/devices/:device_id", get(get_device))
        .route("/devices/:device_id", put(update_device_username))
        // Monthly budget routes
        .route("/monthly-budgets", post(create_monthly_budget))
        .route("/monthly-budgets", get(get_monthly_budgets))
        .route("/monthly-budgets/:month_year", get(get_monthly_budget))
        .route("/monthly-budgets/:month_year", put(update_monthly_budget))
        .route("/monthly-budgets/:month_year", delete(delete_monthly_budget))
        // Settings routes
        .route("/settings", get(get_settings))
        .route("/settings", post(create_setting))
        .route("/settings", put(update_setting))
        // Budget summary
        .route("/budget-summary/:month_year", get(get_budget_summary))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_api_key));

    Router::new()
        .route("/", get(app_info))
        .route("/health", get(health_check))
        .merge(protected)
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
