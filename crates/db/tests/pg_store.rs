//! Integration tests for the Postgres store.
//!
//! These need a live database (`DATABASE_URL`) and are ignored by default:
//! `cargo test -p lapse-db -- --ignored`.

use lapse_core::types::new_id;
use lapse_core::JobStatus;
use lapse_db::models::{CreateFolder, CreateItem, OutputItem};
use lapse_db::{FolderStore, ItemStore, PgStore};
use sqlx::PgPool;

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn concurrent_appends_are_not_lost(pool: PgPool) {
    let store = PgStore::new(pool);
    let folder = FolderStore::create(&store, &CreateFolder::new(new_id(), "t"))
        .await
        .unwrap();
    let folder_id = folder.id;

    let appends = (0..20).map(|i| {
        let store = store.clone();
        let stream = if i % 2 == 0 { "gif" } else { "mp4" };
        async move {
            let item = OutputItem {
                file_id: new_id(),
                name: format!("out-{i}"),
            };
            store
                .append_output_item(folder_id, stream, &item)
                .await
                .unwrap()
        }
    });
    let results = futures::future::join_all(appends).await;
    assert!(results.into_iter().all(|matched| matched));

    let stored = FolderStore::find_by_id(&store, folder.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.output_items["gif"].len(), 10);
    assert_eq!(stored.output_items["mp4"].len(), 10);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn ensure_child_reuses_existing_row(pool: PgPool) {
    let store = PgStore::new(pool);
    let parent = FolderStore::create(&store, &CreateFolder::new(new_id(), "p"))
        .await
        .unwrap();

    let a = store.ensure_child(&parent, "_output").await.unwrap();
    let b = store.ensure_child(&parent, "_output").await.unwrap();
    assert_eq!(a.id, b.id);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn targeted_updates_on_missing_rows_match_nothing(pool: PgPool) {
    let store = PgStore::new(pool);
    let missing = new_id();
    assert!(!store.set_job_status(missing, JobStatus::Running).await.unwrap());
    assert!(!store.adjust_child_count(missing, -1).await.unwrap());
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn ordinal_rename_is_idempotent(pool: PgPool) {
    let store = PgStore::new(pool);
    let item = ItemStore::create(
        &store,
        &CreateItem {
            folder_id: new_id(),
            name: "scan.png".into(),
            is_series: false,
        },
    )
    .await
    .unwrap();

    store.apply_ordinal(item.id, 7, None).await.unwrap();
    let renamed = store.apply_ordinal(item.id, 7, None).await.unwrap().unwrap();
    assert_eq!(renamed.name, "00007_scan.png");
    assert_eq!(renamed.original_name.as_deref(), Some("scan.png"));
}
