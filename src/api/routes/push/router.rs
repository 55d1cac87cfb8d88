//! Router for the push API

use std::sync::Arc;

use axum::{Json, Router, body::Bytes, extract::State};
use http::HeaderMap;
use serde_json::{Value, json};

use super::public;
use crate::api::public::ApiError;
use crate::api::state::AppState;
use crate::api::utils::{authenticate, health, non_empty, parse_json};
use crate::auth::authorize;
use crate::directory::{self, NotificationTarget, Role};
use crate::notify::{NewPushSubscription, PushNotificationPayload, upsert_subscription};

type SharedState = Arc<AppState>;

// Register a device for push notifications
async fn push_subscription(
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let caller_id = authenticate(&state, &headers).await?;

    let request: public::PushSubscriptionRequest = parse_json(&body)?;
    let subscription = request.subscription.unwrap_or_default();
    let (Some(user_id), Some(endpoint), Some(p256dh), Some(auth)) = (
        non_empty(request.user_id),
        non_empty(subscription.endpoint),
        non_empty(subscription.keys.p256dh),
        non_empty(subscription.keys.auth),
    ) else {
        return Err(ApiError::InvalidPayload("Invalid payload".to_string()));
    };

    if user_id != caller_id {
        return Err(ApiError::Forbidden("Forbidden".to_string()));
    }

    let user_agent = headers
        .get(http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string());

    let stored = upsert_subscription(
        &state.db,
        NewPushSubscription {
            user_id,
            endpoint,
            p256dh,
            auth,
            user_agent,
        },
    )
    .await?;
    tracing::info!("Stored push subscription {} for user {}", stored.id, stored.user_id);

    Ok(Json(json!({ "ok": true })))
}

fn notification_target(request: &public::NotifyRequest) -> Result<NotificationTarget, ApiError> {
    let user_id = non_empty(request.target_user_id.clone());
    let role = non_empty(request.target_role.clone());

    match (user_id, role) {
        (Some(user_id), None) => Ok(NotificationTarget::User(user_id)),
        (None, Some(role)) => Role::parse(&role)
            .map(NotificationTarget::Role)
            .ok_or_else(|| ApiError::InvalidPayload(format!("Unknown target role: {}", role))),
        (Some(_), Some(_)) => Err(ApiError::InvalidPayload(
            "Only one of targetUserId or targetRole may be set".to_string(),
        )),
        (None, None) => Err(ApiError::InvalidPayload("Invalid payload".to_string())),
    }
}

// Send a push notification to a user or to everyone with a role
async fn send_notification(
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<public::NotifyResponse>, ApiError> {
    let caller_id = authenticate(&state, &headers).await?;

    let request: public::NotifyRequest = parse_json(&body)?;
    let (Some(title), Some(message)) = (
        non_empty(request.title.clone()),
        non_empty(request.body.clone()),
    ) else {
        return Err(ApiError::InvalidPayload("Invalid payload".to_string()));
    };
    let target = notification_target(&request)?;

    let caller = directory::find_user(&state.db, &caller_id).await?;
    authorize(caller.as_ref(), &target).map_err(|e| ApiError::Forbidden(e.to_string()))?;

    let dispatcher = state.dispatcher()?;
    let payload = PushNotificationPayload::new(&title, &message, request.url.as_deref());
    let result = dispatcher.dispatch_to(&target, &payload).await?;

    Ok(Json(result.into()))
}

async fn notify_health() -> Json<Value> {
    Json(health("push-notify"))
}

// Application server key browsers need to subscribe
async fn vapid_public_key(
    State(state): State<SharedState>,
) -> Result<Json<public::VapidPublicKeyResponse>, ApiError> {
    let vapid = state.config.require_vapid()?;
    Ok(Json(public::VapidPublicKeyResponse {
        public_key: vapid.public_key.clone(),
    }))
}

/// Create the push router
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/subscribe", axum::routing::post(push_subscription))
        .route(
            "/notify",
            axum::routing::post(send_notification).get(notify_health),
        )
        .route("/vapid-public-key", axum::routing::get(vapid_public_key))
}
