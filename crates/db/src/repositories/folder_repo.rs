//! Repository for the `folders` table.
//!
//! Each mutation is one `UPDATE ... WHERE id = $1`; Postgres row locking
//! makes them atomic against concurrent writers without any explicit
//! transaction. Callers read `rows_affected` to detect a missing target.

use lapse_core::types::{new_id, DbId, Timestamp};
use lapse_core::{JobStatus, MaskRect};
use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::{CreateFolder, Folder, OutputItem, OutputItems, SubmissionRecord};
use crate::store::{StoreError, StoreResult};

/// Column list for `folders` queries.
const COLUMNS: &str = "\
    id, name, parent_id, owner_id, description, \
    is_timelapse, is_study, is_example_folder, \
    input_folder_id, output_folder_id, \
    job_id, job_status, mask_rect, output_items, child_count, created_at";

/// Raw `folders` row before domain decoding.
#[derive(Debug, sqlx::FromRow)]
struct FolderRow {
    id: DbId,
    name: String,
    parent_id: Option<DbId>,
    owner_id: DbId,
    description: Option<String>,
    is_timelapse: bool,
    is_study: bool,
    is_example_folder: bool,
    input_folder_id: Option<DbId>,
    output_folder_id: Option<DbId>,
    job_id: Option<DbId>,
    job_status: Option<String>,
    mask_rect: Option<Json<serde_json::Value>>,
    output_items: Json<OutputItems>,
    child_count: i64,
    created_at: Timestamp,
}

impl TryFrom<FolderRow> for Folder {
    type Error = StoreError;

    fn try_from(row: FolderRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let corrupt = |column: &'static str, reason: String| StoreError::Corrupt {
            entity: "folder",
            column,
            id,
            reason,
        };

        let job_status = row
            .job_status
            .as_deref()
            .map(str::parse::<JobStatus>)
            .transpose()
            .map_err(|e| corrupt("job_status", e.to_string()))?;

        let mask_rect = row
            .mask_rect
            .as_ref()
            .map(|Json(v)| MaskRect::from_json(v))
            .transpose()
            .map_err(|e| corrupt("mask_rect", e.to_string()))?;

        Ok(Folder {
            id: row.id,
            name: row.name,
            parent_id: row.parent_id,
            owner_id: row.owner_id,
            description: row.description,
            is_timelapse: row.is_timelapse,
            is_study: row.is_study,
            is_example_folder: row.is_example_folder,
            input_folder_id: row.input_folder_id,
            output_folder_id: row.output_folder_id,
            job_id: row.job_id,
            job_status,
            mask_rect,
            output_items: row.output_items.0,
            child_count: row.child_count,
            created_at: row.created_at,
        })
    }
}

fn decode_all(rows: Vec<FolderRow>) -> StoreResult<Vec<Folder>> {
    rows.into_iter().map(Folder::try_from).collect()
}

/// Provides query operations for folders.
pub struct FolderRepo;

impl FolderRepo {
    // ── Queries ──────────────────────────────────────────────────────

    /// Insert a new folder, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateFolder) -> StoreResult<Folder> {
        let query = format!(
            "INSERT INTO folders (id, name, parent_id, owner_id, description, is_timelapse, is_study) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, FolderRow>(&query)
            .bind(new_id())
            .bind(&input.name)
            .bind(input.parent_id)
            .bind(input.owner_id)
            .bind(&input.description)
            .bind(input.is_timelapse)
            .bind(input.is_study)
            .fetch_one(pool)
            .await?;
        row.try_into()
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> StoreResult<Option<Folder>> {
        let query = format!("SELECT {COLUMNS} FROM folders WHERE id = $1");
        sqlx::query_as::<_, FolderRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?
            .map(Folder::try_from)
            .transpose()
    }

    /// Create-if-absent on the `(parent_id, name)` unique index, then read
    /// back whichever row won.
    pub async fn ensure_child(pool: &PgPool, parent: &Folder, name: &str) -> StoreResult<Folder> {
        sqlx::query(
            "INSERT INTO folders (id, name, parent_id, owner_id) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (parent_id, name) WHERE parent_id IS NOT NULL DO NOTHING",
        )
        .bind(new_id())
        .bind(name)
        .bind(parent.id)
        .bind(parent.owner_id)
        .execute(pool)
        .await?;

        let query = format!("SELECT {COLUMNS} FROM folders WHERE parent_id = $1 AND name = $2");
        let row = sqlx::query_as::<_, FolderRow>(&query)
            .bind(parent.id)
            .bind(name)
            .fetch_one(pool)
            .await?;
        row.try_into()
    }

    pub async fn find_example_folder(pool: &PgPool) -> StoreResult<Option<Folder>> {
        let query = format!(
            "SELECT {COLUMNS} FROM folders WHERE is_example_folder \
             ORDER BY created_at ASC LIMIT 1"
        );
        sqlx::query_as::<_, FolderRow>(&query)
            .fetch_optional(pool)
            .await?
            .map(Folder::try_from)
            .transpose()
    }

    pub async fn list_timelapses(pool: &PgPool, owner_id: DbId) -> StoreResult<Vec<Folder>> {
        let query = format!(
            "SELECT {COLUMNS} FROM folders \
             WHERE is_timelapse AND owner_id = $1 \
             ORDER BY created_at DESC, id DESC"
        );
        let rows = sqlx::query_as::<_, FolderRow>(&query)
            .bind(owner_id)
            .fetch_all(pool)
            .await?;
        decode_all(rows)
    }

    // ── Targeted mutations ───────────────────────────────────────────

    pub async fn set_input_folder(
        pool: &PgPool,
        id: DbId,
        input_folder_id: DbId,
    ) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE folders SET input_folder_id = $2 WHERE id = $1")
            .bind(id)
            .bind(input_folder_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn record_submission(
        pool: &PgPool,
        id: DbId,
        record: &SubmissionRecord,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE folders \
             SET job_id = $2, job_status = $3, mask_rect = $4, \
                 output_folder_id = $5, output_items = $6 \
             WHERE id = $1",
        )
        .bind(id)
        .bind(record.job_id)
        .bind(JobStatus::Queued.as_str())
        .bind(Json(record.mask_rect))
        .bind(record.output_folder_id)
        .bind(Json(record.initial_output_items()))
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Append to one stream's list inside the `output_items` document.
    ///
    /// `jsonb_set` rewrites only the `stream` key, and the row lock taken by
    /// `UPDATE` serialises concurrent appends, so none are lost.
    pub async fn append_output_item(
        pool: &PgPool,
        id: DbId,
        stream: &str,
        item: &OutputItem,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE folders \
             SET output_items = jsonb_set( \
                 output_items, \
                 ARRAY[$2::text], \
                 COALESCE(output_items -> $2::text, '[]'::jsonb) || jsonb_build_array($3::jsonb), \
                 true) \
             WHERE id = $1",
        )
        .bind(id)
        .bind(stream)
        .bind(Json(item))
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn set_job_status(pool: &PgPool, id: DbId, status: JobStatus) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE folders SET job_status = $2 WHERE id = $1")
            .bind(id)
            .bind(status.as_str())
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn adjust_child_count(pool: &PgPool, id: DbId, delta: i64) -> StoreResult<bool> {
        let result =
            sqlx::query("UPDATE folders SET child_count = child_count + $2 WHERE id = $1")
                .bind(id)
                .bind(delta)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn set_example_flag(pool: &PgPool, id: DbId, enabled: bool) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE folders SET is_example_folder = $2 WHERE id = $1")
            .bind(id)
            .bind(enabled)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
