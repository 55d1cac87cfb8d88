//! Role directory: who is an admin, who is a technician, and how a
//! notification target expands into user ids.
pub mod db;
pub mod models;
pub use db::*;
pub use models::*;

use std::collections::HashSet;

use anyhow::{Error, Result};
use tokio_rusqlite::Connection;

/// Expand a notification target into the set of user ids it
/// addresses. An explicit user needs no lookup; a role that nobody
/// holds resolves to an empty set.
pub async fn resolve(db: &Connection, target: &NotificationTarget) -> Result<HashSet<String>, Error> {
    match target {
        NotificationTarget::User(user_id) => Ok(HashSet::from([user_id.clone()])),
        NotificationTarget::Role(role) => {
            let ids = find_user_ids_by_role(db, *role).await?;
            Ok(ids.into_iter().collect())
        }
    }
}
