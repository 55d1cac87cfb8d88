use anyhow::{Error, Result};
use tokio_rusqlite::Connection;
use uuid::Uuid;

use super::models::{NewPushSubscription, PushSubscription};

fn subscription_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PushSubscription> {
    Ok(PushSubscription {
        id: row.get(0)?,
        user_id: row.get(1)?,
        endpoint: row.get(2)?,
        p256dh: row.get(3)?,
        auth: row.get(4)?,
        user_agent: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

/// Insert a subscription or overwrite the one already registered for
/// the same endpoint. The row id survives the overwrite.
pub async fn upsert_subscription(
    db: &Connection,
    subscription: NewPushSubscription,
) -> Result<PushSubscription, Error> {
    let id = Uuid::new_v4().to_string();
    let stored = db
        .call(move |conn| {
            conn.execute(
                r#"
                INSERT INTO push_subscription (id, user_id, endpoint, p256dh, auth, user_agent)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ON CONFLICT(endpoint) DO UPDATE SET
                    user_id = excluded.user_id,
                    p256dh = excluded.p256dh,
                    auth = excluded.auth,
                    user_agent = excluded.user_agent,
                    updated_at = CURRENT_TIMESTAMP
                "#,
                tokio_rusqlite::params![
                    id,
                    subscription.user_id,
                    subscription.endpoint,
                    subscription.p256dh,
                    subscription.auth,
                    subscription.user_agent,
                ],
            )?;
            let stored = conn.query_row(
                "SELECT id, user_id, endpoint, p256dh, auth, user_agent, created_at, updated_at
                 FROM push_subscription WHERE endpoint = ?",
                [&subscription.endpoint],
                subscription_from_row,
            )?;
            Ok(stored)
        })
        .await?;
    Ok(stored)
}

pub async fn find_subscriptions_for_users(
    db: &Connection,
    user_ids: &[String],
) -> Result<Vec<PushSubscription>, Error> {
    if user_ids.is_empty() {
        return Ok(Vec::new());
    }
    let ids = user_ids.to_vec();
    let subscriptions = db
        .call(move |conn| {
            let placeholders = vec!["?"; ids.len()].join(", ");
            let mut stmt = conn.prepare(&format!(
                "SELECT id, user_id, endpoint, p256dh, auth, user_agent, created_at, updated_at
                 FROM push_subscription WHERE user_id IN ({})",
                placeholders
            ))?;
            let rows = stmt
                .query_map(rusqlite::params_from_iter(ids.iter()), subscription_from_row)?
                .collect::<Result<Vec<PushSubscription>, _>>()?;
            Ok(rows)
        })
        .await?;
    Ok(subscriptions)
}

/// Delete a subscription by id. Returns whether a row was removed;
/// deleting a row that is already gone is not an error.
pub async fn delete_subscription(db: &Connection, subscription_id: &str) -> Result<bool, Error> {
    let id = subscription_id.to_owned();
    let deleted = db
        .call(move |conn| {
            let count = conn.execute("DELETE FROM push_subscription WHERE id = ?", [&id])?;
            Ok(count)
        })
        .await?;
    Ok(deleted > 0)
}
