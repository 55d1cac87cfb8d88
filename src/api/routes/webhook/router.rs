//! Router for the change-capture webhook

use std::sync::Arc;

use axum::{Json, Router, body::Bytes, extract::State};
use http::HeaderMap;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use super::public::{ChangeEvent, ClaimNotifications, RoleDelivery, WebhookResponse};
use crate::api::public::ApiError;
use crate::api::state::AppState;
use crate::api::utils::{health, non_empty, parse_json};
use crate::claims::{ChangeType, ClaimChange, ClaimRecord, PreviousClaim, notification_for_change};
use crate::directory::Role;
use crate::notify::Dispatcher;

type SharedState = Arc<AppState>;

const SECRET_HEADER: &str = "x-webhook-secret";

/// The shared secret must match byte for byte. Runs before anything
/// else looks at the request.
fn verify_secret(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let expected = state.config.require_webhook_secret()?;
    let Some(provided) = headers.get(SECRET_HEADER) else {
        return Err(ApiError::Unauthorized(
            "Missing X-Webhook-Secret header".to_string(),
        ));
    };
    if provided.as_bytes() != expected.as_bytes() {
        return Err(ApiError::Unauthorized("Invalid webhook secret".to_string()));
    }
    Ok(())
}

fn claim_record<T: DeserializeOwned>(value: Option<Value>, what: &str) -> Result<Option<T>, ApiError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(v) => serde_json::from_value(v)
            .map(Some)
            .map_err(|e| ApiError::InvalidPayload(format!("Invalid {} record: {}", what, e))),
    }
}

fn claim_change(
    change_type: ChangeType,
    old: Option<Value>,
    new: Option<Value>,
) -> Result<ClaimChange, ApiError> {
    let old: Option<PreviousClaim> = claim_record(old, "old")?;
    let new: Option<ClaimRecord> = claim_record(new, "new")?;
    match (change_type, old, new) {
        (ChangeType::Insert, _, Some(new)) => Ok(ClaimChange::Insert { new }),
        (ChangeType::Insert, _, None) => Err(ApiError::InvalidPayload(
            "Missing new record data for INSERT".to_string(),
        )),
        (ChangeType::Update, Some(old), Some(new)) => Ok(ClaimChange::Update { old, new }),
        (ChangeType::Update, _, _) => Err(ApiError::InvalidPayload(
            "Missing record data for UPDATE".to_string(),
        )),
        (ChangeType::Delete, old, _) => Ok(ClaimChange::Delete { old }),
    }
}

fn raw_record_id(new: Option<&Value>, old: Option<&Value>) -> Option<String> {
    [new, old]
        .into_iter()
        .flatten()
        .find_map(|record| record.get("id").and_then(Value::as_str))
        .map(|id| id.to_string())
}

async fn deliver_to_role(
    dispatcher: &Dispatcher,
    role: Role,
    payload: &crate::notify::PushNotificationPayload,
) -> RoleDelivery {
    match dispatcher.dispatch_to_role(role, payload).await {
        Ok(result) => RoleDelivery::Delivered(result),
        Err(e) => {
            tracing::error!("Dispatch to role {} failed: {}", role, e);
            RoleDelivery::Failed {
                error: e.to_string(),
            }
        }
    }
}

// Handle a row change on the claims table
async fn claims_webhook(
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    verify_secret(&state, &headers)?;

    let event: ChangeEvent = parse_json(&body)?;
    let (Some(table), Some(event_type)) = (non_empty(event.table), non_empty(event.event_type))
    else {
        return Err(ApiError::InvalidPayload(
            "Invalid payload structure".to_string(),
        ));
    };

    if table != state.config.claims_table {
        tracing::debug!("Ignoring {} event for table {}", event_type, table);
        return Ok(Json(json!({
            "ok": true,
            "message": format!("Ignoring non-{} table: {}", state.config.claims_table, table),
        })));
    }

    tracing::info!("Processing {} on {}", event_type, table);
    let dispatcher = state.dispatcher()?;

    let Some(change_type) = ChangeType::parse(&event_type) else {
        tracing::info!("Unknown event type {}, nothing to notify", event_type);
        let response = WebhookResponse {
            ok: true,
            record_id: raw_record_id(event.new.as_ref(), event.old.as_ref()),
            table,
            event_type,
            notifications: None,
        };
        return Ok(Json(serde_json::to_value(response)?));
    };
    let change = claim_change(change_type, event.old, event.new)?;
    let record_id = change.record_id().map(|id| id.to_string());

    let notifications = match notification_for_change(&change) {
        None => {
            tracing::info!(
                "No notification for {} on claim {}",
                event_type,
                record_id.as_deref().unwrap_or("unknown")
            );
            None
        }
        Some(notification) => {
            let mut out = ClaimNotifications {
                admin: None,
                technicians: None,
            };
            // Roles are dispatched one after the other and a failure in
            // one does not skip the rest
            for role in &notification.roles {
                let delivery = deliver_to_role(&dispatcher, *role, &notification.payload).await;
                match role {
                    Role::Admin => out.admin = Some(delivery),
                    Role::Technician => out.technicians = Some(delivery),
                }
            }
            Some(out)
        }
    };

    let response = WebhookResponse {
        ok: true,
        table,
        event_type,
        record_id,
        notifications,
    };
    Ok(Json(serde_json::to_value(response)?))
}

async fn webhook_health() -> Json<Value> {
    Json(health("push-webhook"))
}

/// Create the webhook router
pub fn router() -> Router<SharedState> {
    Router::new().route(
        "/webhook",
        axum::routing::post(claims_webhook).get(webhook_health),
    )
}
