//! Public types for the push API
use serde::{Deserialize, Serialize};

use crate::notify::DeliveryResult;

#[derive(Deserialize, Default)]
pub struct SubscriptionKeys {
    pub p256dh: Option<String>,
    pub auth: Option<String>,
}

/// A browser `PushSubscription` as produced by `subscription.toJSON()`.
#[derive(Deserialize, Default)]
pub struct BrowserSubscription {
    pub endpoint: Option<String>,
    #[serde(default)]
    pub keys: SubscriptionKeys,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushSubscriptionRequest {
    pub user_id: Option<String>,
    pub subscription: Option<BrowserSubscription>,
}

/// Direct notification request. Exactly one of `target_user_id` and
/// `target_role` must be set.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotifyRequest {
    pub target_user_id: Option<String>,
    pub target_role: Option<String>,
    pub title: Option<String>,
    pub body: Option<String>,
    pub url: Option<String>,
}

#[derive(Serialize)]
pub struct NotifyResponse {
    pub ok: bool,
    pub sent: usize,
    pub removed: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl From<DeliveryResult> for NotifyResponse {
    fn from(result: DeliveryResult) -> Self {
        Self {
            ok: true,
            sent: result.sent,
            removed: result.removed,
            errors: result.errors,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VapidPublicKeyResponse {
    pub public_key: String,
}
