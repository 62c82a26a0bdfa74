//! Item database operations

use crate::db::models::Item;
use crate::{Error, Result};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

const ITEM_COLUMNS: &str = "guid, code, old_code, collection_guid, file";

fn parse_guid(value: &str, column: &str) -> Result<Uuid> {
    Uuid::parse_str(value).map_err(|e| Error::InvalidInput(format!("{} {}: {}", column, value, e)))
}

fn item_from_row(row: &SqliteRow) -> Result<Item> {
    let guid_str: String = row.get("guid");
    let collection_str: String = row.get("collection_guid");

    Ok(Item {
        guid: parse_guid(&guid_str, "item guid")?,
        code: row.get("code"),
        old_code: row.get("old_code"),
        collection_guid: parse_guid(&collection_str, "collection guid")?,
        file: row.get("file"),
    })
}

/// Find an item by exact code
pub async fn find_by_code(pool: &SqlitePool, code: &str) -> Result<Option<Item>> {
    let sql = format!("SELECT {} FROM items WHERE code = ?", ITEM_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(code)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(item_from_row).transpose()
}

/// Find the first item (in insertion order) carrying a legacy code
pub async fn find_by_old_code(pool: &SqlitePool, old_code: &str) -> Result<Option<Item>> {
    let sql = format!(
        "SELECT {} FROM items WHERE old_code = ? ORDER BY rowid LIMIT 1",
        ITEM_COLUMNS
    );
    let row = sqlx::query(&sql)
        .bind(old_code)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(item_from_row).transpose()
}

/// Insert a new item in a collection, without file or legacy code
pub async fn create(pool: &SqlitePool, code: &str, collection_guid: Uuid) -> Result<Item> {
    insert(pool, code, None, collection_guid).await
}

/// Insert a new item carrying a legacy code
pub async fn create_with_old_code(
    pool: &SqlitePool,
    code: &str,
    old_code: &str,
    collection_guid: Uuid,
) -> Result<Item> {
    insert(pool, code, Some(old_code), collection_guid).await
}

async fn insert(
    pool: &SqlitePool,
    code: &str,
    old_code: Option<&str>,
    collection_guid: Uuid,
) -> Result<Item> {
    let item = Item {
        guid: Uuid::new_v4(),
        code: code.to_string(),
        old_code: old_code.map(str::to_string),
        collection_guid,
        file: None,
    };

    sqlx::query(
        r#"
        INSERT INTO items (guid, code, old_code, collection_guid, file, created_at, updated_at)
        VALUES (?, ?, ?, ?, NULL, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(item.guid.to_string())
    .bind(&item.code)
    .bind(&item.old_code)
    .bind(item.collection_guid.to_string())
    .execute(pool)
    .await?;

    Ok(item)
}

/// Fetch an item by code, creating it in `collection_guid` when absent
///
/// An existing item keeps its collection. Returns whether the item was created.
pub async fn get_or_create(
    pool: &SqlitePool,
    code: &str,
    collection_guid: Uuid,
) -> Result<(Item, bool)> {
    if let Some(item) = find_by_code(pool, code).await? {
        return Ok((item, false));
    }

    let item = create(pool, code, collection_guid).await?;
    Ok((item, true))
}

/// Persist the attached file path of an item
pub async fn set_file(pool: &SqlitePool, guid: Uuid, file: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE items
        SET file = ?, updated_at = CURRENT_TIMESTAMP
        WHERE guid = ?
        "#,
    )
    .bind(file)
    .bind(guid.to_string())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("item {}", guid)));
    }

    Ok(())
}

/// Change the code of an item
pub async fn rename(pool: &SqlitePool, guid: Uuid, new_code: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE items
        SET code = ?, updated_at = CURRENT_TIMESTAMP
        WHERE guid = ?
        "#,
    )
    .bind(new_code)
    .bind(guid.to_string())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("item {}", guid)));
    }

    Ok(())
}

/// Load all items of a collection ordered by code
pub async fn list_by_collection(pool: &SqlitePool, collection_guid: Uuid) -> Result<Vec<Item>> {
    let sql = format!(
        "SELECT {} FROM items WHERE collection_guid = ? ORDER BY code",
        ITEM_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(collection_guid.to_string())
        .fetch_all(pool)
        .await?;

    rows.iter().map(item_from_row).collect()
}

/// Count all items
pub async fn count(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{collections, init::init_memory_database};

    #[tokio::test]
    async fn test_get_or_create_keeps_existing_collection() {
        let pool = init_memory_database().await.unwrap();
        let a = collections::create(&pool, "A").await.unwrap();
        let b = collections::create(&pool, "B").await.unwrap();

        let (item, created) = get_or_create(&pool, "X1", a.guid).await.unwrap();
        assert!(created);

        let (again, created) = get_or_create(&pool, "X1", b.guid).await.unwrap();
        assert!(!created);
        assert_eq!(again.guid, item.guid);
        assert_eq!(again.collection_guid, a.guid);
    }

    #[tokio::test]
    async fn test_set_file_and_rename() {
        let pool = init_memory_database().await.unwrap();
        let c = collections::create(&pool, "C").await.unwrap();
        let item = create_with_old_code(&pool, "old2", "old2", c.guid).await.unwrap();
        assert!(!item.has_file());

        set_file(&pool, item.guid, "items/2024/05/01/new2.wav").await.unwrap();
        rename(&pool, item.guid, "new2").await.unwrap();

        assert!(find_by_code(&pool, "old2").await.unwrap().is_none());
        let renamed = find_by_code(&pool, "new2").await.unwrap().unwrap();
        assert_eq!(renamed.old_code.as_deref(), Some("old2"));
        assert_eq!(renamed.file.as_deref(), Some("items/2024/05/01/new2.wav"));
        assert!(renamed.has_file());
    }

    #[tokio::test]
    async fn test_rename_to_taken_code_fails() {
        let pool = init_memory_database().await.unwrap();
        let c = collections::create(&pool, "C").await.unwrap();
        create(&pool, "taken", c.guid).await.unwrap();
        let item = create(&pool, "free", c.guid).await.unwrap();

        let result = rename(&pool, item.guid, "taken").await;
        assert!(matches!(result, Err(Error::Database(_))));
    }

    #[tokio::test]
    async fn test_unknown_item_is_not_found() {
        let pool = init_memory_database().await.unwrap();
        let result = set_file(&pool, Uuid::new_v4(), "x.wav").await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_by_collection_orders_by_code() {
        let pool = init_memory_database().await.unwrap();
        let c = collections::create(&pool, "C").await.unwrap();
        create(&pool, "b", c.guid).await.unwrap();
        create(&pool, "a", c.guid).await.unwrap();

        let codes: Vec<String> = list_by_collection(&pool, c.guid)
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.code)
            .collect();
        assert_eq!(codes, vec!["a", "b"]);
    }
}
