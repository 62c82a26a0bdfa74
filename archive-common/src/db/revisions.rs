//! Revision tracking
//!
//! Every change the import makes to a collection or item is recorded
//! against the acting user.

use crate::db::models::{ChangeType, ElementType, Revision};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

fn revision_from_row(row: &SqliteRow, element_type: ElementType) -> Result<Revision> {
    let parse = |value: String| {
        Uuid::parse_str(&value).map_err(|e| Error::InvalidInput(format!("guid {}: {}", value, e)))
    };

    let change_str: String = row.get("change_type");
    let change_type = ChangeType::parse(&change_str)
        .ok_or_else(|| Error::InvalidInput(format!("change type {}", change_str)))?;

    let time_str: String = row.get("time");
    let time = DateTime::parse_from_rfc3339(&time_str)
        .map_err(|e| Error::InvalidInput(format!("revision time {}: {}", time_str, e)))?
        .with_timezone(&Utc);

    Ok(Revision {
        id: row.get("id"),
        element_type,
        element_guid: parse(row.get("element_guid"))?,
        change_type,
        user_guid: parse(row.get("user_guid"))?,
        time,
    })
}

/// Record a revision of an element by a user
///
/// The first revision of an element is a `create`; later ones are `update`.
pub async fn touch(
    pool: &SqlitePool,
    element_type: ElementType,
    element_guid: Uuid,
    user_guid: Uuid,
) -> Result<Revision> {
    let previous: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM revisions WHERE element_type = ? AND element_guid = ?",
    )
    .bind(element_type.as_str())
    .bind(element_guid.to_string())
    .fetch_one(pool)
    .await?;

    let change_type = if previous == 0 {
        ChangeType::Create
    } else {
        ChangeType::Update
    };
    let time = Utc::now();

    let id = sqlx::query(
        r#"
        INSERT INTO revisions (element_type, element_guid, change_type, user_guid, time)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(element_type.as_str())
    .bind(element_guid.to_string())
    .bind(change_type.as_str())
    .bind(user_guid.to_string())
    .bind(time.to_rfc3339())
    .execute(pool)
    .await?
    .last_insert_rowid();

    Ok(Revision {
        id,
        element_type,
        element_guid,
        change_type,
        user_guid,
        time,
    })
}

/// Load the revisions of one element, oldest first
pub async fn list_for(
    pool: &SqlitePool,
    element_type: ElementType,
    element_guid: Uuid,
) -> Result<Vec<Revision>> {
    let rows = sqlx::query(
        r#"
        SELECT id, element_guid, change_type, user_guid, time
        FROM revisions
        WHERE element_type = ? AND element_guid = ?
        ORDER BY id
        "#,
    )
    .bind(element_type.as_str())
    .bind(element_guid.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| revision_from_row(row, element_type))
        .collect()
}
