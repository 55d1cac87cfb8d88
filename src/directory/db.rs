use anyhow::{Error, Result};
use rusqlite::OptionalExtension;
use tokio_rusqlite::Connection;

use super::models::{DirectoryEntry, Role};

pub async fn find_user(db: &Connection, user_id: &str) -> Result<Option<DirectoryEntry>, Error> {
    let id = user_id.to_owned();
    let row = db
        .call(move |conn| {
            let row = conn
                .query_row(
                    "SELECT id, role FROM app_user WHERE id = ?",
                    [&id],
                    |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
                )
                .optional()?;
            Ok(row)
        })
        .await?;

    Ok(row.map(|(id, role)| {
        let parsed = Role::parse(&role);
        if parsed.is_none() {
            tracing::warn!("User {} has unrecognized role {:?}", id, role);
        }
        DirectoryEntry { id, role: parsed }
    }))
}

pub async fn find_user_ids_by_role(db: &Connection, role: Role) -> Result<Vec<String>, Error> {
    let values: Vec<String> = role
        .stored_values()
        .iter()
        .map(|v| v.to_string())
        .collect();
    let ids = db
        .call(move |conn| {
            let placeholders = vec!["?"; values.len()].join(", ");
            let mut stmt = conn.prepare(&format!(
                "SELECT id FROM app_user WHERE role IN ({})",
                placeholders
            ))?;
            let ids = stmt
                .query_map(rusqlite::params_from_iter(values.iter()), |row| row.get(0))?
                .collect::<Result<Vec<String>, _>>()?;
            Ok(ids)
        })
        .await?;
    Ok(ids)
}

/// Create or update a directory entry. The directory is normally
/// managed by the backend; this exists for seeding and tests.
pub async fn upsert_user(db: &Connection, user_id: &str, role: Role) -> Result<(), Error> {
    let id = user_id.to_owned();
    db.call(move |conn| {
        conn.execute(
            "INSERT INTO app_user (id, role) VALUES (?1, ?2)
             ON CONFLICT(id) DO UPDATE SET role = excluded.role",
            tokio_rusqlite::params![id, role.as_str()],
        )?;
        Ok(())
    })
    .await?;
    Ok(())
}
