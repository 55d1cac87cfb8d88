//! Encrypted delivery of a single Web Push message.
//!
//! Payload encryption (RFC 8291, aes128gcm) and the VAPID signature
//! (RFC 8292) come from the `web-push` crate. The request itself goes
//! out through `reqwest` so the push service's status code can be
//! classified here.

use async_trait::async_trait;
use web_push::{
    ContentEncoding, SubscriptionInfo, VapidSignatureBuilder, WebPushError, WebPushMessage,
    WebPushMessageBuilder,
};

use super::models::PushSubscription;
use crate::core::VapidConfig;

// Push services may hold undelivered messages for a day
const TTL_SECONDS: u32 = 60 * 60 * 24;

/// How a single delivery attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    /// The push service reports the subscription no longer exists
    /// (404 or 410). The subscription should be dropped.
    Gone(u16),
    Failed(String),
}

#[async_trait]
pub trait PushSender: Send + Sync {
    async fn send(&self, subscription: &PushSubscription, payload: &[u8]) -> DeliveryOutcome;
}

pub struct WebPushSender {
    client: reqwest::Client,
    vapid: VapidConfig,
}

impl WebPushSender {
    pub fn new(vapid: VapidConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            vapid,
        }
    }

    fn build_message(
        &self,
        subscription: &PushSubscription,
        payload: &[u8],
    ) -> Result<WebPushMessage, WebPushError> {
        let info = SubscriptionInfo::new(
            &subscription.endpoint,
            &subscription.p256dh,
            &subscription.auth,
        );

        let mut sig_builder = VapidSignatureBuilder::from_base64(&self.vapid.private_key, &info)?;
        sig_builder.add_claim("sub", self.vapid.subject.as_str());
        let signature = sig_builder.build()?;

        let mut builder = WebPushMessageBuilder::new(&info);
        builder.set_payload(ContentEncoding::Aes128Gcm, payload);
        builder.set_vapid_signature(signature);
        builder.set_ttl(TTL_SECONDS);
        builder.build()
    }
}

#[async_trait]
impl PushSender for WebPushSender {
    async fn send(&self, subscription: &PushSubscription, payload: &[u8]) -> DeliveryOutcome {
        let message = match self.build_message(subscription, payload) {
            Ok(m) => m,
            Err(e) => return DeliveryOutcome::Failed(format!("Invalid subscription: {}", e)),
        };

        let mut request = self
            .client
            .post(message.endpoint.to_string())
            .header("TTL", message.ttl.to_string());

        if let Some(urgency) = message.urgency {
            request = request.header("Urgency", urgency.to_string());
        }

        if let Some(topic) = message.topic {
            request = request.header("Topic", topic);
        }

        if let Some(push_payload) = message.payload {
            request = request
                .header("Content-Encoding", push_payload.content_encoding.to_str())
                .header("Content-Type", "application/octet-stream");

            for (key, value) in &push_payload.crypto_headers {
                request = request.header(*key, value.as_str());
            }

            request = request.body(push_payload.content);
        }

        let response = match request.send().await {
            Ok(r) => r,
            Err(e) => return DeliveryOutcome::Failed(format!("Push request failed: {}", e)),
        };

        let status = response.status().as_u16();
        match status {
            200..=299 => DeliveryOutcome::Delivered,
            404 | 410 => DeliveryOutcome::Gone(status),
            _ => {
                let body = response.text().await.unwrap_or_default();
                DeliveryOutcome::Failed(format!(
                    "Push service responded with HTTP {}: {}",
                    status,
                    body.trim()
                ))
            }
        }
    }
}
