mod common;

use std::sync::Arc;

use assert_matches::assert_matches;
use lapse_core::{Correlation, JobStatus, MaskRect};
use lapse_db::{FolderStore, MemoryStore};
use lapse_engine::ContainerArg;
use lapse_pipeline::{JobSubmitter, PipelineError, ResultStream, SubmitterConfig};
use serde_json::json;

use common::{folder, timelapse, FakeEngine};

fn submitter(store: &Arc<MemoryStore>, engine: &Arc<FakeEngine>) -> JobSubmitter {
    JobSubmitter::new(store.clone(), engine.clone(), SubmitterConfig::default())
}

#[tokio::test]
async fn valid_submission_queues_one_job() {
    let store = Arc::new(MemoryStore::new());
    let engine = Arc::new(FakeEngine::default());
    let (target, input) = timelapse(&store, "Harbour").await;

    let handle = submitter(&store, &engine)
        .submit(input.id, &json!([[10, 20], [110, 220]]))
        .await
        .unwrap();

    assert_eq!(handle.status, JobStatus::Queued);
    assert_eq!(handle.target_id, target.id);
    assert_eq!(engine.submitted().len(), 1);

    let target = folder(&store, target.id).await.unwrap();
    assert_eq!(target.job_id, Some(handle.job_id));
    assert_eq!(target.job_status, Some(JobStatus::Queued));
    assert_eq!(target.mask_rect, Some(MaskRect::new([10, 20], [110, 220])));
    assert_eq!(target.output_items.len(), 2);
    assert!(target.output_items["mp4"].is_empty());
    assert!(target.output_items["gif"].is_empty());
}

#[tokio::test]
async fn job_describes_container_invocation() {
    let store = Arc::new(MemoryStore::new());
    let engine = Arc::new(FakeEngine::default());
    let (target, input) = timelapse(&store, "Harbour").await;

    submitter(&store, &engine)
        .submit(input.id, &json!([[0, 0], [5, 5]]))
        .await
        .unwrap();

    let job = engine.submitted().remove(0);
    assert_eq!(job.image, "photomorph:latest");
    assert_eq!(job.title, "Timelapse creation: Harbour");
    assert!(!job.pull_image);
    assert_eq!(job.input.folder_id, input.id);
    assert_eq!(job.input.mount_name, "_input");
    assert!(job.input.read_only);
    assert_eq!(job.args.len(), 7);
    assert_eq!(job.args[4], ContainerArg::Literal("--mask-rect".into()));
    assert_eq!(job.args[5], ContainerArg::Literal("0,0,5,5".into()));
    assert_eq!(job.args[6], ContainerArg::Input);

    let output_id = folder(&store, target.id).await.unwrap().output_folder_id.unwrap();
    let output = folder(&store, output_id).await.unwrap();
    assert_eq!(output.name, "_output");
    assert_eq!(output.parent_id, Some(target.id));

    for (hook, stream) in job.result_hooks.iter().zip(["mp4", "gif"]) {
        let dest = folder(&store, hook.folder_id).await.unwrap();
        assert_eq!(dest.name, format!("{stream}s"));
        assert_eq!(dest.parent_id, Some(output_id));
        assert_eq!(
            Correlation::decode(Some(&hook.reference)),
            Correlation::stream_append(target.id, stream)
        );
    }
}

#[tokio::test]
async fn resubmitting_reuses_output_folders() {
    let store = Arc::new(MemoryStore::new());
    let engine = Arc::new(FakeEngine::default());
    let (_, input) = timelapse(&store, "Harbour").await;
    let submitter = submitter(&store, &engine);

    submitter.submit(input.id, &json!([[0, 0], [1, 1]])).await.unwrap();
    let folders_after_first = store.folder_count().await;
    submitter.submit(input.id, &json!([[0, 0], [1, 1]])).await.unwrap();

    assert_eq!(store.folder_count().await, folders_after_first);
    let jobs = engine.submitted();
    assert_eq!(jobs[0].result_hooks, jobs[1].result_hooks);
}

#[tokio::test]
async fn invalid_rect_fails_before_any_mutation() {
    let store = Arc::new(MemoryStore::new());
    let engine = Arc::new(FakeEngine::default());
    let (target, input) = timelapse(&store, "Harbour").await;
    let submitter = submitter(&store, &engine);

    for bad in [
        json!([[0, 0], [1, 1], [2, 2]]),
        json!([[0, -1], [1, 1]]),
        json!([[0, 0, 0], [1, 1]]),
        json!("0,0,1,1"),
    ] {
        let result = submitter.submit(input.id, &bad).await;
        assert_matches!(result, Err(PipelineError::Validation(_)), "{bad}");
    }

    assert!(engine.submitted().is_empty());
    assert_eq!(store.folder_count().await, 2);
    assert_eq!(folder(&store, target.id).await.unwrap(), target);
}

#[tokio::test]
async fn missing_input_folder_is_not_found() {
    let store = Arc::new(MemoryStore::new());
    let engine = Arc::new(FakeEngine::default());

    let result = submitter(&store, &engine)
        .submit(uuid::Uuid::now_v7(), &json!([[0, 0], [1, 1]]))
        .await;

    assert_matches!(result, Err(PipelineError::NotFound { entity: "folder", .. }));
    assert_eq!(store.folder_count().await, 0);
}

#[tokio::test]
async fn engine_failure_leaves_target_untouched() {
    let store = Arc::new(MemoryStore::new());
    let engine = Arc::new(FakeEngine::failing());
    let (target, input) = timelapse(&store, "Harbour").await;

    let result = submitter(&store, &engine)
        .submit(input.id, &json!([[0, 0], [1, 1]]))
        .await;

    assert_matches!(result, Err(PipelineError::Submission(_)));
    assert_eq!(folder(&store, target.id).await.unwrap(), target);
    // `_output`, `mp4s` and `gifs` stay behind.
    assert_eq!(store.folder_count().await, 5);
}

#[tokio::test]
async fn custom_streams_and_pull_flag() {
    let store = Arc::new(MemoryStore::new());
    let engine = Arc::new(FakeEngine::default());
    let (target, input) = timelapse(&store, "Harbour").await;
    let config = SubmitterConfig {
        image: "registry.local/photomorph:2".into(),
        pull_image: true,
        ..Default::default()
    };
    let submitter = JobSubmitter::new(store.clone(), engine.clone(), config);

    submitter
        .submit_streams(input.id, &[ResultStream::new("webm")], &json!([[0, 0], [1, 1]]))
        .await
        .unwrap();

    let job = engine.submitted().remove(0);
    assert_eq!(job.image, "registry.local/photomorph:2");
    assert!(job.pull_image);
    assert_eq!(job.args[0], ContainerArg::Literal("--webm-out".into()));
    let target = FolderStore::find_by_id(store.as_ref(), target.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(target.output_items.keys().collect::<Vec<_>>(), vec!["webm"]);
}
