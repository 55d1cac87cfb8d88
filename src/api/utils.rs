use axum::body::Bytes;
use http::HeaderMap;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use super::public::ApiError;
use super::state::AppState;

/// Parse a JSON request body. Bodies are read raw so that auth checks
/// run before any payload validation.
pub fn parse_json<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| {
        tracing::debug!("Invalid JSON body: {}", e);
        ApiError::InvalidPayload("Invalid payload".to_string())
    })
}

/// Resolve the caller's user id from the bearer token.
pub async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<String, ApiError> {
    let token = crate::auth::bearer_token(headers)
        .ok_or_else(|| ApiError::Unauthorized("Unauthorized".to_string()))?;
    let user_id = state
        .identity()?
        .user_id(&token)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Unauthorized".to_string()))?;
    Ok(user_id)
}

/// Liveness payload served on GET by the push endpoints.
pub fn health(name: &str) -> Value {
    json!({
        "ok": true,
        "name": name,
        "version": env!("CARGO_PKG_VERSION"),
        "time": chrono::Utc::now().to_rfc3339(),
    })
}

/// Treat empty strings like missing values.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
