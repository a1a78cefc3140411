//! Item entity and DTOs.

use chrono::NaiveDateTime;
use lapse_core::types::{DbId, Timestamp};
use serde::Serialize;

/// A row from the `items` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Item {
    pub id: DbId,
    pub folder_id: DbId,
    pub name: String,
    /// Name before ordinal renaming, if renamed.
    pub original_name: Option<String>,
    /// EXIF capture time, if one could be read.
    pub taken_at: Option<NaiveDateTime>,
    pub is_series: bool,
    pub created_at: Timestamp,
}

/// DTO for creating an item.
#[derive(Debug, Clone)]
pub struct CreateItem {
    pub folder_id: DbId,
    pub name: String,
    pub is_series: bool,
}
