//! Integration tests for the push API endpoints

mod test_utils;

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::json;
    use tower::util::ServiceExt;

    use cospec_push::notify::DeliveryOutcome;

    use crate::test_utils::{body_to_json, body_to_string, post_json, test_app, test_app_with};

    fn subscribe_body(user_id: &str, endpoint: &str, p256dh: &str) -> serde_json::Value {
        json!({
            "userId": user_id,
            "subscription": {
                "endpoint": endpoint,
                "expirationTime": null,
                "keys": {
                    "p256dh": p256dh,
                    "auth": "test-auth-key"
                }
            }
        })
    }

    /// Tests push subscription with valid request
    #[tokio::test]
    async fn it_subscribes_to_push_notifications() {
        let app = test_app().await;

        let mut request = post_json(
            "/api/push/subscribe",
            Some("tech-token"),
            subscribe_body("tech-1", "https://push.example.com/device-1", "key-1"),
        );
        request
            .headers_mut()
            .insert("user-agent", "Mozilla/5.0 (Android)".parse().unwrap());

        let response = app.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_to_string(response.into_body()).await;
        assert!(body.contains("\"ok\":true"));

        let subs = app.subscriptions_for("tech-1").await;
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].endpoint, "https://push.example.com/device-1");
        assert_eq!(subs[0].user_agent.as_deref(), Some("Mozilla/5.0 (Android)"));
    }

    /// Tests re-subscribing the same endpoint replaces the keys
    #[tokio::test]
    async fn it_overwrites_subscription_for_same_endpoint() {
        let app = test_app().await;

        for key in ["key-1", "key-2"] {
            let response = app
                .router
                .clone()
                .oneshot(post_json(
                    "/api/push/subscribe",
                    Some("tech-token"),
                    subscribe_body("tech-1", "https://push.example.com/device-1", key),
                ))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let subs = app.subscriptions_for("tech-1").await;
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].p256dh, "key-2");
    }

    /// Tests push subscription requires a bearer token
    #[tokio::test]
    async fn it_returns_401_without_token() {
        let app = test_app().await;

        let response = app
            .router
            .clone()
            .oneshot(post_json(
                "/api/push/subscribe",
                None,
                subscribe_body("tech-1", "https://push.example.com/device-1", "key"),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(app.subscriptions_for("tech-1").await.is_empty());
    }

    /// Tests tokens rejected by the auth service are unauthorized
    #[tokio::test]
    async fn it_returns_401_for_rejected_token() {
        let app = test_app().await;

        let response = app
            .router
            .clone()
            .oneshot(post_json(
                "/api/push/subscribe",
                Some("expired-token"),
                subscribe_body("tech-1", "https://push.example.com/device-1", "key"),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    /// Tests a caller can't register a device for someone else
    #[tokio::test]
    async fn it_returns_403_for_subscribing_another_user() {
        let app = test_app().await;

        let response = app
            .router
            .clone()
            .oneshot(post_json(
                "/api/push/subscribe",
                Some("tech-token"),
                subscribe_body("tech-2", "https://push.example.com/device-1", "key"),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(app.subscriptions_for("tech-2").await.is_empty());
    }

    /// Tests push subscription returns 400 for missing keys
    #[tokio::test]
    async fn it_returns_400_for_missing_keys() {
        let app = test_app().await;

        let response = app
            .router
            .clone()
            .oneshot(post_json(
                "/api/push/subscribe",
                Some("tech-token"),
                json!({
                    "userId": "tech-1",
                    "subscription": {
                        "endpoint": "https://push.example.com/device-1",
                        "keys": { "auth": "test-auth-key" }
                    }
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    /// Tests push subscription returns 405 for GET requests
    #[tokio::test]
    async fn it_returns_405_for_get_on_subscribe() {
        let app = test_app().await;

        let response = app
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/push/subscribe")
                    .method("GET")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    /// Tests the notify endpoint answers health checks
    #[tokio::test]
    async fn it_returns_health_on_get_notify() {
        let app = test_app().await;

        let response = app
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/push/notify")
                    .method("GET")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_to_json(response.into_body()).await;
        assert_eq!(body["ok"], true);
        assert_eq!(body["name"], "push-notify");
    }

    /// Tests notify rejects requests missing title, body or target
    #[tokio::test]
    async fn it_returns_400_for_invalid_notify_payloads() {
        let app = test_app().await;
        app.subscribe("admin-1", "https://push.example.com/admin-1").await;

        let invalid = [
            json!({ "targetRole": "admin", "body": "b" }),
            json!({ "targetRole": "admin", "title": "t" }),
            json!({ "targetRole": "admin", "title": "", "body": "b" }),
            json!({ "title": "t", "body": "b" }),
            json!({ "title": "t", "body": "b", "targetUserId": "" }),
            json!({ "title": "t", "body": "b", "targetRole": "manager" }),
            json!({ "title": "t", "body": "b", "targetRole": "admin", "targetUserId": "admin-1" }),
        ];

        for payload in invalid {
            let response = app
                .router
                .clone()
                .oneshot(post_json("/api/push/notify", Some("admin-token"), payload.clone()))
                .await
                .unwrap();
            assert_eq!(
                response.status(),
                StatusCode::BAD_REQUEST,
                "payload {} should be rejected",
                payload
            );
        }

        assert!(app.sender.deliveries().is_empty());
    }

    /// Tests invalid JSON is a validation error
    #[tokio::test]
    async fn it_returns_400_for_invalid_json() {
        let app = test_app().await;

        let response = app
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/push/notify")
                    .method("POST")
                    .header("content-type", "application/json")
                    .header("authorization", "Bearer admin-token")
                    .body(Body::from("{invalid json}"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    /// Tests notify requires authentication before anything else
    #[tokio::test]
    async fn it_returns_401_for_notify_without_token() {
        let app = test_app().await;

        let response = app
            .router
            .clone()
            .oneshot(post_json("/api/push/notify", None, json!({})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    /// Tests admins can notify every technician
    #[tokio::test]
    async fn it_notifies_technicians_as_admin() {
        let app = test_app().await;
        app.subscribe("tech-1", "https://push.example.com/tech-1").await;
        app.subscribe("tech-2", "https://push.example.com/tech-2").await;
        app.subscribe("admin-1", "https://push.example.com/admin-1").await;

        let response = app
            .router
            .clone()
            .oneshot(post_json(
                "/api/push/notify",
                Some("admin-token"),
                json!({
                    "targetRole": "technician",
                    "title": "Nuevo trabajo",
                    "body": "Revisar zona norte",
                    "url": "/reclamos/123"
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_to_json(response.into_body()).await;
        assert_eq!(body, json!({ "ok": true, "sent": 2, "removed": 0 }));

        assert_eq!(
            app.sender.endpoints(),
            vec![
                "https://push.example.com/tech-1".to_string(),
                "https://push.example.com/tech-2".to_string()
            ]
        );
        let (_, payload) = &app.sender.deliveries()[0];
        assert_eq!(payload.title, "Nuevo trabajo");
        assert_eq!(payload.body, "Revisar zona norte");
        assert_eq!(payload.url, "/reclamos/123");
    }

    /// Tests the legacy role name is accepted
    #[tokio::test]
    async fn it_accepts_legacy_technician_role_name() {
        let app = test_app().await;
        app.subscribe("tech-1", "https://push.example.com/tech-1").await;

        let response = app
            .router
            .clone()
            .oneshot(post_json(
                "/api/push/notify",
                Some("admin-token"),
                json!({ "targetRole": "tecnico", "title": "t", "body": "b" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(app.sender.deliveries().len(), 1);
    }

    /// Tests technicians can't notify the technician role
    #[tokio::test]
    async fn it_returns_403_for_technician_notifying_technicians() {
        let app = test_app().await;
        app.subscribe("tech-2", "https://push.example.com/tech-2").await;

        let response = app
            .router
            .clone()
            .oneshot(post_json(
                "/api/push/notify",
                Some("tech-token"),
                json!({ "targetRole": "technician", "title": "t", "body": "b" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = body_to_json(response.into_body()).await;
        assert_eq!(body["error"], "only admin can notify technicians");
        assert!(app.sender.deliveries().is_empty());
    }

    /// Tests technicians can reach admins, with a default url
    #[tokio::test]
    async fn it_notifies_admins_as_technician() {
        let app = test_app().await;
        app.subscribe("admin-1", "https://push.example.com/admin-1").await;
        app.subscribe("admin-2", "https://push.example.com/admin-2").await;

        let response = app
            .router
            .clone()
            .oneshot(post_json(
                "/api/push/notify",
                Some("tech-token"),
                json!({ "targetRole": "admin", "title": "Trabajo listo", "body": "Cerrado" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_to_json(response.into_body()).await;
        assert_eq!(body["sent"], 2);
        assert!(
            app.sender
                .deliveries()
                .iter()
                .all(|(_, payload)| payload.url == "/")
        );
    }

    /// Tests self-notification is allowed for any role
    #[tokio::test]
    async fn it_allows_technician_to_notify_self() {
        let app = test_app().await;
        app.subscribe("tech-1", "https://push.example.com/tech-1").await;

        let response = app
            .router
            .clone()
            .oneshot(post_json(
                "/api/push/notify",
                Some("tech-token"),
                json!({ "targetUserId": "tech-1", "title": "t", "body": "b" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            app.sender.endpoints(),
            vec!["https://push.example.com/tech-1".to_string()]
        );
    }

    /// Tests technicians can't notify another specific user
    #[tokio::test]
    async fn it_returns_403_for_technician_notifying_other_user() {
        let app = test_app().await;
        app.subscribe("tech-2", "https://push.example.com/tech-2").await;

        let response = app
            .router
            .clone()
            .oneshot(post_json(
                "/api/push/notify",
                Some("tech-token"),
                json!({ "targetUserId": "tech-2", "title": "t", "body": "b" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(app.sender.deliveries().is_empty());
    }

    /// Tests authenticated users missing from the directory are forbidden
    #[tokio::test]
    async fn it_returns_403_for_unknown_caller() {
        let app = test_app().await;

        let response = app
            .router
            .clone()
            .oneshot(post_json(
                "/api/push/notify",
                Some("stranger-token"),
                json!({ "targetRole": "admin", "title": "t", "body": "b" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = body_to_json(response.into_body()).await;
        assert_eq!(body["error"], "unknown caller");
    }

    /// Tests a user without devices yields an empty result
    #[tokio::test]
    async fn it_returns_zero_counts_without_devices() {
        let app = test_app().await;

        let response = app
            .router
            .clone()
            .oneshot(post_json(
                "/api/push/notify",
                Some("admin-token"),
                json!({ "targetUserId": "nobody", "title": "t", "body": "b" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_to_json(response.into_body()).await;
        assert_eq!(body, json!({ "ok": true, "sent": 0, "removed": 0 }));
        assert!(app.sender.deliveries().is_empty());
    }

    /// Tests gone devices are pruned and failures are reported
    #[tokio::test]
    async fn it_reports_partial_delivery() {
        let app = test_app().await;
        app.subscribe("admin-1", "https://push.example.com/ok").await;
        app.subscribe("admin-1", "https://push.example.com/gone").await;
        app.subscribe("admin-2", "https://push.example.com/down").await;
        app.sender
            .respond("https://push.example.com/gone", DeliveryOutcome::Gone(410));
        app.sender.respond(
            "https://push.example.com/down",
            DeliveryOutcome::Failed("Push service responded with HTTP 503: ".to_string()),
        );

        let response = app
            .router
            .clone()
            .oneshot(post_json(
                "/api/push/notify",
                Some("admin-token"),
                json!({ "targetRole": "admin", "title": "t", "body": "b" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_to_json(response.into_body()).await;
        assert_eq!(body["ok"], true);
        assert_eq!(body["sent"], 1);
        assert_eq!(body["removed"], 1);
        assert_eq!(body["errors"].as_array().unwrap().len(), 1);

        let admin_1: Vec<String> = app
            .subscriptions_for("admin-1")
            .await
            .into_iter()
            .map(|s| s.endpoint)
            .collect();
        assert_eq!(admin_1, vec!["https://push.example.com/ok".to_string()]);
        assert_eq!(app.subscriptions_for("admin-2").await.len(), 1);
    }

    /// Tests notify fails when the server can't sign push messages
    #[tokio::test]
    async fn it_returns_500_without_vapid_keys() {
        let app = test_app_with(|config| config.vapid = None).await;
        app.subscribe("admin-1", "https://push.example.com/admin-1").await;

        let response = app
            .router
            .clone()
            .oneshot(post_json(
                "/api/push/notify",
                Some("admin-token"),
                json!({ "targetRole": "admin", "title": "t", "body": "b" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_to_json(response.into_body()).await;
        assert!(body["error"].as_str().unwrap().contains("VAPID"));
    }

    /// Tests the application server key is published
    #[tokio::test]
    async fn it_returns_vapid_public_key() {
        let app = test_app().await;

        let response = app
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/push/vapid-public-key")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_to_json(response.into_body()).await;
        // 65 byte point, base64url without padding
        assert_eq!(body["publicKey"].as_str().unwrap().len(), 87);
    }
}
