use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::config;
use crate::schemas::AppState;

/// Bearer-token gate applied to every route except the public root and
/// health endpoints. The expected token is the `api_key` setting row,
/// seeded on first use.
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(token) = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
    else {
        warn!("rejected request without bearer token");
        return Err(StatusCode::UNAUTHORIZED);
    };

    let expected = config::api_key(&state.db).await.map_err(|db_error| {
        warn!("could not load api key: {}", db_error);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    if token != expected {
        warn!("rejected request with invalid API key");
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(next.run(request).await)
}
