use anyhow::Result;

use crate::core::db::{async_db, initialize_db};
use crate::directory::{Role, upsert_user};

pub async fn run(db_path: &str, user_id: &str, role: Role) -> Result<()> {
    let db = async_db(db_path).await?;
    db.call(|conn| {
        initialize_db(conn)?;
        Ok(())
    })
    .await?;
    upsert_user(&db, user_id, role).await?;
    println!("User {} is now {}", user_id, role);
    Ok(())
}
