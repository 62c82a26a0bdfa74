//! Collection database operations

use crate::db::models::Collection;
use crate::{Error, Result};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

fn collection_from_row(row: &SqliteRow) -> Result<Collection> {
    let guid_str: String = row.get("guid");
    let guid = Uuid::parse_str(&guid_str)
        .map_err(|e| Error::InvalidInput(format!("collection guid {}: {}", guid_str, e)))?;

    Ok(Collection {
        guid,
        code: row.get("code"),
    })
}

/// Find a collection by exact code
pub async fn find_by_code(pool: &SqlitePool, code: &str) -> Result<Option<Collection>> {
    let row = sqlx::query("SELECT guid, code FROM collections WHERE code = ?")
        .bind(code)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(collection_from_row).transpose()
}

/// Insert a new collection
pub async fn create(pool: &SqlitePool, code: &str) -> Result<Collection> {
    let collection = Collection {
        guid: Uuid::new_v4(),
        code: code.to_string(),
    };

    sqlx::query(
        r#"
        INSERT INTO collections (guid, code, created_at, updated_at)
        VALUES (?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(collection.guid.to_string())
    .bind(&collection.code)
    .execute(pool)
    .await?;

    Ok(collection)
}

/// Fetch a collection by code, creating it when absent
///
/// Returns the collection and whether it was created by this call.
pub async fn get_or_create(pool: &SqlitePool, code: &str) -> Result<(Collection, bool)> {
    if let Some(collection) = find_by_code(pool, code).await? {
        return Ok((collection, false));
    }

    let collection = create(pool, code).await?;
    Ok((collection, true))
}

/// Count all collections
pub async fn count(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM collections")
        .fetch_one(pool)
        .await?;
    Ok(count)
}
