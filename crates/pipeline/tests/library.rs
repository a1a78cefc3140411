mod common;

use std::sync::Arc;

use assert_matches::assert_matches;
use lapse_db::MemoryStore;
use lapse_events::{EventBus, ItemEvent, ItemLifecycle};
use lapse_pipeline::library::{CreateSeries, CreateStudy};
use lapse_pipeline::{PipelineError, TimelapseLibrary};

use common::{folder, item, owner};

fn library(store: &Arc<MemoryStore>, bus: &Arc<EventBus>) -> TimelapseLibrary {
    TimelapseLibrary::new(store.clone(), store.clone(), bus.clone())
}

#[tokio::test]
async fn create_timelapse_lays_out_input_folder() {
    let store = Arc::new(MemoryStore::new());
    let library = library(&store, &Arc::default());
    let owner_id = owner();

    let input = library
        .create_timelapse(owner_id, Some("  Harbour  ".into()))
        .await
        .unwrap();

    assert_eq!(input.name, "_input");
    let timelapse = folder(&store, input.parent_id.unwrap()).await.unwrap();
    assert_eq!(timelapse.name, "Harbour");
    assert!(timelapse.is_timelapse);
    assert_eq!(timelapse.owner_id, owner_id);
    assert_eq!(timelapse.input_folder_id, Some(input.id));
    assert_eq!(input.owner_id, owner_id);
}

#[tokio::test]
async fn unnamed_timelapse_gets_timestamped_name() {
    let store = Arc::new(MemoryStore::new());
    let library = library(&store, &Arc::default());

    for name in [None, Some(String::new()), Some("   ".into())] {
        let input = library.create_timelapse(owner(), name).await.unwrap();
        let timelapse = folder(&store, input.parent_id.unwrap()).await.unwrap();
        assert!(timelapse.name.starts_with("Timelapse "), "{}", timelapse.name);
    }
}

#[tokio::test]
async fn list_timelapses_is_per_owner_newest_first() {
    let store = Arc::new(MemoryStore::new());
    let library = library(&store, &Arc::default());
    let (alice, bob) = (owner(), owner());

    library.create_timelapse(alice, Some("first".into())).await.unwrap();
    library.create_timelapse(bob, Some("other".into())).await.unwrap();
    library.create_timelapse(alice, Some("second".into())).await.unwrap();

    let names: Vec<_> = library
        .list_timelapses(alice)
        .await
        .unwrap()
        .into_iter()
        .map(|f| f.name)
        .collect();
    assert_eq!(names, vec!["second", "first"]);
}

#[tokio::test]
async fn examples_follow_the_flagged_folder() {
    let store = Arc::new(MemoryStore::new());
    let library = library(&store, &Arc::default());
    assert!(library.list_examples().await.unwrap().is_empty());

    let input = library.create_timelapse(owner(), Some("Demo".into())).await.unwrap();
    item(&store, input.id, "b.png").await;
    item(&store, input.id, "a.png").await;

    library.set_example_folder(input.id, true).await.unwrap();
    let names: Vec<_> = library
        .list_examples()
        .await
        .unwrap()
        .into_iter()
        .map(|i| i.name)
        .collect();
    assert_eq!(names, vec!["a.png", "b.png"]);

    library.set_example_folder(input.id, false).await.unwrap();
    assert!(library.list_examples().await.unwrap().is_empty());
}

#[tokio::test]
async fn flagging_missing_folder_is_not_found() {
    let store = Arc::new(MemoryStore::new());
    let library = library(&store, &Arc::default());

    let result = library.set_example_folder(uuid::Uuid::now_v7(), true).await;
    assert_matches!(result, Err(PipelineError::NotFound { entity: "folder", .. }));
}

#[tokio::test]
async fn series_changes_are_published() {
    let store = Arc::new(MemoryStore::new());
    let bus = Arc::new(EventBus::default());
    let mut events = bus.subscribe_to::<ItemEvent>();
    let library = library(&store, &bus);

    let study = library
        .create_study(
            owner(),
            CreateStudy {
                name: "Coastline".into(),
                description: None,
            },
        )
        .await
        .unwrap();
    assert!(study.is_study);
    let series = library
        .create_series(study.id, CreateSeries { name: "north".into() })
        .await
        .unwrap();
    assert!(series.is_series);
    library.remove_item(series.id).await.unwrap();

    let expected = ItemLifecycle {
        item_id: series.id,
        folder_id: study.id,
        is_series: true,
    };
    assert_eq!(events.recv().await, Some(ItemEvent::Created(expected.clone())));
    assert_eq!(events.recv().await, Some(ItemEvent::Removed(expected)));
}
