//! Fan a notification out to every device registered by a set of
//! users, then prune the subscriptions the push services reported as
//! gone.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{Error, Result};
use tokio::task::JoinSet;
use tokio_rusqlite::Connection;

use super::db::{delete_subscription, find_subscriptions_for_users};
use super::models::{DeliveryResult, PushNotificationPayload, PushSubscription};
use super::sender::{DeliveryOutcome, PushSender};
use crate::directory::{self, NotificationTarget, Role};

/// What happened to one subscription, after cleanup.
enum Settled {
    Sent,
    Removed,
    Error(String),
}

/// The single delivery path shared by the notify API and the change
/// webhook.
#[derive(Clone)]
pub struct Dispatcher {
    db: Connection,
    sender: Arc<dyn PushSender>,
}

impl Dispatcher {
    pub fn new(db: Connection, sender: Arc<dyn PushSender>) -> Self {
        Self { db, sender }
    }

    /// Deliver `payload` to every subscription owned by `user_ids`.
    ///
    /// Individual delivery failures never fail the call: they show up in
    /// `errors`, or as `removed` when the push service says the
    /// subscription is gone. Only a failure to read the subscription
    /// store is returned as an error.
    pub async fn dispatch(
        &self,
        user_ids: &HashSet<String>,
        payload: &PushNotificationPayload,
    ) -> Result<DeliveryResult, Error> {
        if user_ids.is_empty() {
            return Ok(DeliveryResult::default());
        }

        let ids: Vec<String> = user_ids.iter().cloned().collect();
        let subscriptions = find_subscriptions_for_users(&self.db, &ids).await?;
        if subscriptions.is_empty() {
            tracing::debug!("No push subscriptions for {} user(s)", ids.len());
            return Ok(DeliveryResult::default());
        }

        let content: Arc<[u8]> = serde_json::to_vec(payload)?.into();

        let mut tasks = JoinSet::new();
        for sub in subscriptions {
            tasks.spawn(deliver(
                self.db.clone(),
                Arc::clone(&self.sender),
                sub,
                Arc::clone(&content),
            ));
        }

        let mut result = DeliveryResult::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Settled::Sent) => result.sent += 1,
                Ok(Settled::Removed) => result.removed += 1,
                Ok(Settled::Error(msg)) => result.errors.push(msg),
                Err(e) => result.errors.push(format!("Delivery task failed: {}", e)),
            }
        }

        tracing::info!(
            "Dispatched \"{}\": sent={} removed={} errors={}",
            payload.title,
            result.sent,
            result.removed,
            result.errors.len()
        );
        Ok(result)
    }

    /// Resolve `target` through the directory and dispatch to it.
    pub async fn dispatch_to(
        &self,
        target: &NotificationTarget,
        payload: &PushNotificationPayload,
    ) -> Result<DeliveryResult, Error> {
        let user_ids = directory::resolve(&self.db, target).await?;
        self.dispatch(&user_ids, payload).await
    }

    pub async fn dispatch_to_role(
        &self,
        role: Role,
        payload: &PushNotificationPayload,
    ) -> Result<DeliveryResult, Error> {
        self.dispatch_to(&NotificationTarget::Role(role), payload)
            .await
    }
}

async fn deliver(
    db: Connection,
    sender: Arc<dyn PushSender>,
    sub: PushSubscription,
    content: Arc<[u8]>,
) -> Settled {
    match sender.send(&sub, &content).await {
        DeliveryOutcome::Delivered => Settled::Sent,
        DeliveryOutcome::Gone(status) => {
            tracing::info!(
                "Subscription {} is gone (HTTP {}), removing it",
                sub.id,
                status
            );
            match delete_subscription(&db, &sub.id).await {
                Ok(_) => Settled::Removed,
                Err(e) => {
                    tracing::error!("Failed to remove subscription {}: {}", sub.id, e);
                    Settled::Error(format!("Failed to remove gone subscription: {}", e))
                }
            }
        }
        DeliveryOutcome::Failed(msg) => {
            tracing::warn!("Push to subscription {} failed: {}", sub.id, msg);
            Settled::Error(msg)
        }
    }
}
