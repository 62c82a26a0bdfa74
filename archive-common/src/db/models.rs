//! Database models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Archive collection, one per source directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    pub guid: Uuid,
    pub code: String,
}

/// Archive item with an optional attached audio file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub guid: Uuid,
    pub code: String,
    /// Legacy identifier used when items are renamed from a manifest
    pub old_code: Option<String>,
    pub collection_guid: Uuid,
    /// Stored file, relative to the media root
    pub file: Option<String>,
}

impl Item {
    /// True when a file is attached
    pub fn has_file(&self) -> bool {
        self.file.as_deref().is_some_and(|f| !f.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub guid: Uuid,
    pub username: String,
}

/// Kind of record a revision points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    Collection,
    Item,
}

impl ElementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementType::Collection => "collection",
            ElementType::Item => "item",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Create,
    Update,
}

impl ChangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeType::Create => "create",
            ChangeType::Update => "update",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "create" => Some(ChangeType::Create),
            "update" => Some(ChangeType::Update),
            _ => None,
        }
    }
}

/// Change record: who touched which element, and when
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    pub id: i64,
    pub element_type: ElementType,
    pub element_guid: Uuid,
    pub change_type: ChangeType,
    pub user_guid: Uuid,
    pub time: DateTime<Utc>,
}
