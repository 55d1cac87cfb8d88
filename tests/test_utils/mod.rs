//! Test utilities for integration tests
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{Router, body::Body, http::Request};
use tokio_rusqlite::Connection;

use cospec_push::api::{AppState, app};
use cospec_push::core::db::memory_db;
use cospec_push::core::{AppConfig, AuthBackendConfig, VapidConfig};
use cospec_push::directory::{Role, upsert_user};
use cospec_push::notify::{
    DeliveryOutcome, NewPushSubscription, PushNotificationPayload, PushSender, PushSubscription,
    VapidKeys, find_subscriptions_for_users, upsert_subscription,
};

pub const WEBHOOK_SECRET: &str = "test-webhook-secret";

/// Bearer tokens the fake auth service accepts, and who they belong to.
/// `stranger-1` has a valid login but no directory entry.
pub const USERS: &[(&str, &str)] = &[
    ("admin-token", "admin-1"),
    ("tech-token", "tech-1"),
    ("stranger-token", "stranger-1"),
];

/// Push transport that records deliveries instead of sending them.
/// Endpoints default to a successful delivery.
#[derive(Default)]
pub struct RecordingSender {
    outcomes: Mutex<HashMap<String, DeliveryOutcome>>,
    sent: Mutex<Vec<(String, PushNotificationPayload)>>,
}

impl RecordingSender {
    pub fn respond(&self, endpoint: &str, outcome: DeliveryOutcome) {
        self.outcomes
            .lock()
            .unwrap()
            .insert(endpoint.to_string(), outcome);
    }

    pub fn deliveries(&self) -> Vec<(String, PushNotificationPayload)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn endpoints(&self) -> Vec<String> {
        let mut endpoints: Vec<String> = self.deliveries().into_iter().map(|(e, _)| e).collect();
        endpoints.sort();
        endpoints
    }
}

#[async_trait]
impl PushSender for RecordingSender {
    async fn send(&self, subscription: &PushSubscription, payload: &[u8]) -> DeliveryOutcome {
        let payload: PushNotificationPayload =
            serde_json::from_slice(payload).expect("Payload should be the notification JSON");
        self.sent
            .lock()
            .unwrap()
            .push((subscription.endpoint.clone(), payload));
        self.outcomes
            .lock()
            .unwrap()
            .get(&subscription.endpoint)
            .cloned()
            .unwrap_or(DeliveryOutcome::Delivered)
    }
}

pub struct TestApp {
    pub router: Router,
    pub db: Connection,
    pub sender: Arc<RecordingSender>,
    // Mocks are removed from the server when dropped
    _auth_server: mockito::ServerGuard,
    _auth_mocks: Vec<mockito::Mock>,
}

impl TestApp {
    /// Register a device for `user_id` directly in the store.
    pub async fn subscribe(&self, user_id: &str, endpoint: &str) {
        upsert_subscription(
            &self.db,
            NewPushSubscription {
                user_id: user_id.to_string(),
                endpoint: endpoint.to_string(),
                p256dh: "test-p256dh-key".to_string(),
                auth: "test-auth-key".to_string(),
                user_agent: None,
            },
        )
        .await
        .unwrap();
    }

    pub async fn subscriptions_for(&self, user_id: &str) -> Vec<PushSubscription> {
        find_subscriptions_for_users(&self.db, &[user_id.to_string()])
            .await
            .unwrap()
    }
}

fn default_config(auth_url: String) -> AppConfig {
    let keys = VapidKeys::generate();
    AppConfig {
        storage_path: String::from("./"),
        db_path: String::from(":memory:"),
        vapid: Some(VapidConfig {
            public_key: keys.public_key_base64url().to_string(),
            private_key: keys.private_key_base64url().to_string(),
            subject: String::from("mailto:test@example.com"),
        }),
        webhook_secret: Some(String::from(WEBHOOK_SECRET)),
        auth_backend: Some(AuthBackendConfig {
            url: auth_url,
            anon_key: String::from("test-anon-key"),
        }),
        claims_table: String::from("reclamos"),
    }
}

/// Creates a test application with an in-memory database, a fake auth
/// service and a recording push transport.
///
/// The directory holds two admins (`admin-1`, `admin-2`) and two
/// technicians (`tech-1`, `tech-2`).
pub async fn test_app() -> TestApp {
    test_app_with(|_| {}).await
}

/// Like `test_app` but lets the test adjust the config first.
pub async fn test_app_with<F>(adjust: F) -> TestApp
where
    F: FnOnce(&mut AppConfig),
{
    let mut server = mockito::Server::new_async().await;
    let mut mocks = Vec::new();
    for (token, user_id) in USERS {
        let mock = server
            .mock("GET", "/auth/v1/user")
            .match_header("authorization", format!("Bearer {}", token).as_str())
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(serde_json::json!({ "id": user_id }).to_string())
            .create_async()
            .await;
        mocks.push(mock);
    }

    let db = memory_db().await.expect("Failed to create test db");
    upsert_user(&db, "admin-1", Role::Admin).await.unwrap();
    upsert_user(&db, "admin-2", Role::Admin).await.unwrap();
    upsert_user(&db, "tech-1", Role::Technician).await.unwrap();
    upsert_user(&db, "tech-2", Role::Technician).await.unwrap();

    let mut config = default_config(server.url());
    adjust(&mut config);

    let sender = Arc::new(RecordingSender::default());
    let mut app_state = AppState::new(db.clone(), config.clone());
    if config.vapid.is_some() {
        app_state = app_state.with_push_sender(sender.clone());
    }

    TestApp {
        router: app(Arc::new(app_state)),
        db,
        sender,
        _auth_server: server,
        _auth_mocks: mocks,
    }
}

/// JSON POST, optionally with a bearer token.
pub fn post_json(uri: &str, token: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .uri(uri)
        .method("POST")
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub async fn body_to_string(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_to_json(body: Body) -> serde_json::Value {
    serde_json::from_str(&body_to_string(body).await).unwrap()
}
