use serde::{Deserialize, Serialize};

/// A device registration for Web Push. `endpoint` is unique across
/// all users.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PushSubscription {
    pub id: String,
    pub user_id: String,
    pub endpoint: String,
    pub p256dh: String,
    pub auth: String,
    pub user_agent: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Fields a device sends when it (re)subscribes.
#[derive(Debug, Clone)]
pub struct NewPushSubscription {
    pub user_id: String,
    pub endpoint: String,
    pub p256dh: String,
    pub auth: String,
    pub user_agent: Option<String>,
}

/// The JSON document the service worker receives. The shape is fixed:
/// the worker reads `title` and `body` for display and opens `url`
/// when the notification is clicked.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PushNotificationPayload {
    pub title: String,
    pub body: String,
    pub url: String,
}

impl PushNotificationPayload {
    pub fn new(title: &str, body: &str, url: Option<&str>) -> Self {
        Self {
            title: title.to_string(),
            body: body.to_string(),
            url: url
                .filter(|u| !u.is_empty())
                .unwrap_or("/")
                .to_string(),
        }
    }
}

/// Aggregate outcome of one fan-out.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct DeliveryResult {
    pub sent: usize,
    pub removed: usize,
    pub errors: Vec<String>,
}
