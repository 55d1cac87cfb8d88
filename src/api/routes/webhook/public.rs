//! Public types for the webhook API
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::notify::DeliveryResult;

/// Row change event posted by the database webhook. Records stay as
/// raw JSON until the table is known to be the claims table.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    pub table: Option<String>,
    pub event_type: Option<String>,
    #[serde(default)]
    pub old: Option<Value>,
    #[serde(default)]
    pub new: Option<Value>,
}

/// Result of one role's fan-out. A failure for one role does not
/// prevent the others from being notified.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum RoleDelivery {
    Delivered(DeliveryResult),
    Failed { error: String },
}

#[derive(Debug, Serialize)]
pub struct ClaimNotifications {
    pub admin: Option<RoleDelivery>,
    pub technicians: Option<RoleDelivery>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookResponse {
    pub ok: bool,
    pub table: String,
    pub event_type: String,
    pub record_id: Option<String>,
    pub notifications: Option<ClaimNotifications>,
}
