//! User lookups

use crate::db::models::User;
use crate::{Error, Result};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Find a user by exact username
pub async fn find_by_username(pool: &SqlitePool, username: &str) -> Result<Option<User>> {
    let row = sqlx::query("SELECT guid, username FROM users WHERE username = ?")
        .bind(username)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => {
            let guid_str: String = row.get("guid");
            let guid = Uuid::parse_str(&guid_str)
                .map_err(|e| Error::InvalidInput(format!("user guid {}: {}", guid_str, e)))?;

            Ok(Some(User {
                guid,
                username: row.get("username"),
            }))
        }
        None => Ok(None),
    }
}

/// Insert a user account
pub async fn create(pool: &SqlitePool, username: &str) -> Result<User> {
    let user = User {
        guid: Uuid::new_v4(),
        username: username.to_string(),
    };

    sqlx::query("INSERT INTO users (guid, username) VALUES (?, ?)")
        .bind(user.guid.to_string())
        .bind(&user.username)
        .execute(pool)
        .await?;

    Ok(user)
}
