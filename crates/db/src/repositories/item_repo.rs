//! Repository for the `items` table.

use chrono::NaiveDateTime;
use lapse_core::naming::ordinal_prefix;
use lapse_core::types::{new_id, DbId};
use sqlx::PgPool;

use crate::models::{CreateItem, Item};
use crate::store::StoreResult;

/// Column list for `items` queries.
const COLUMNS: &str = "\
    id, folder_id, name, original_name, taken_at, is_series, created_at";

/// Provides query operations for items.
pub struct ItemRepo;

impl ItemRepo {
    pub async fn create(pool: &PgPool, input: &CreateItem) -> StoreResult<Item> {
        let query = format!(
            "INSERT INTO items (id, folder_id, name, is_series) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Item>(&query)
            .bind(new_id())
            .bind(input.folder_id)
            .bind(&input.name)
            .bind(input.is_series)
            .fetch_one(pool)
            .await?)
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> StoreResult<Option<Item>> {
        let query = format!("SELECT {COLUMNS} FROM items WHERE id = $1");
        Ok(sqlx::query_as::<_, Item>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?)
    }

    /// Rename from `original_name` (or the current name on first rename).
    ///
    /// All right-hand sides see the pre-update row, so the prefix is never
    /// stacked on replays.
    pub async fn apply_ordinal(
        pool: &PgPool,
        id: DbId,
        index: u64,
        taken_at: Option<NaiveDateTime>,
    ) -> StoreResult<Option<Item>> {
        let query = format!(
            "UPDATE items \
             SET original_name = COALESCE(original_name, name), \
                 name = $2 || COALESCE(original_name, name), \
                 taken_at = COALESCE($3, taken_at) \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Item>(&query)
            .bind(id)
            .bind(ordinal_prefix(index))
            .bind(taken_at)
            .fetch_optional(pool)
            .await?)
    }

    pub async fn remove(pool: &PgPool, id: DbId) -> StoreResult<Option<Item>> {
        let query = format!("DELETE FROM items WHERE id = $1 RETURNING {COLUMNS}");
        Ok(sqlx::query_as::<_, Item>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?)
    }

    pub async fn list_in_folder(pool: &PgPool, folder_id: DbId) -> StoreResult<Vec<Item>> {
        let query = format!("SELECT {COLUMNS} FROM items WHERE folder_id = $1 ORDER BY name ASC");
        Ok(sqlx::query_as::<_, Item>(&query)
            .bind(folder_id)
            .fetch_all(pool)
            .await?)
    }
}
