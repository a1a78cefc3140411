//! Builds and submits the timelapse container job.
//!
//! Submission is fire-and-forget: [`JobSubmitter::submit`] returns as soon
//! as the engine has queued the job. Progress and outputs come back later
//! as bus events handled by the status propagator and the correlator.

use std::sync::Arc;

use lapse_core::naming::{job_title, INPUT_FOLDER_NAME, OUTPUT_FOLDER_NAME};
use lapse_core::types::DbId;
use lapse_core::{Correlation, MaskRect};
use lapse_db::models::{Folder, SubmissionRecord};
use lapse_db::FolderStore;
use lapse_engine::{ContainerJob, ExecutionEngine, InputVolume, JobHandle, ResultHook, VolumePath};
use serde_json::Value;

use crate::error::PipelineError;

/// Image used when none is configured.
pub const DEFAULT_IMAGE: &str = "photomorph:latest";

/// A named output channel of the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultStream {
    /// Key under `output_items`, e.g. `mp4`.
    pub name: String,
    /// Container flag announcing the output directory, e.g. `--mp4-out`.
    pub flag: String,
    /// Scratch volume the container writes into.
    pub volume: VolumePath,
    /// Child of `_output` receiving the uploads, e.g. `mp4s`.
    pub folder_name: String,
}

impl ResultStream {
    /// Derive flag, volume and folder from the stream name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            flag: format!("--{name}-out"),
            volume: VolumePath::new(format!("__output_{name}s__/")),
            folder_name: format!("{name}s"),
            name,
        }
    }
}

/// Static submission settings.
#[derive(Debug, Clone)]
pub struct SubmitterConfig {
    pub image: String,
    pub pull_image: bool,
    /// Streams requested when the caller does not name any.
    pub streams: Vec<ResultStream>,
}

impl Default for SubmitterConfig {
    fn default() -> Self {
        Self {
            image: DEFAULT_IMAGE.to_string(),
            pull_image: false,
            streams: vec![ResultStream::new("mp4"), ResultStream::new("gif")],
        }
    }
}

/// Submits timelapse jobs against an input folder.
pub struct JobSubmitter {
    folders: Arc<dyn FolderStore>,
    engine: Arc<dyn ExecutionEngine>,
    config: SubmitterConfig,
}

impl JobSubmitter {
    pub fn new(
        folders: Arc<dyn FolderStore>,
        engine: Arc<dyn ExecutionEngine>,
        config: SubmitterConfig,
    ) -> Self {
        Self {
            folders,
            engine,
            config,
        }
    }

    pub fn config(&self) -> &SubmitterConfig {
        &self.config
    }

    /// Submit with the configured default streams.
    pub async fn submit(
        &self,
        input_folder_id: DbId,
        mask_rect: &Value,
    ) -> Result<JobHandle, PipelineError> {
        self.submit_streams(input_folder_id, &self.config.streams, mask_rect)
            .await
    }

    /// Submit a job producing `streams` from the images in `input_folder_id`.
    ///
    /// Parameters are validated and the target resolved before anything is
    /// written. Output folders are ensured before the engine call and are
    /// left in place if it fails; the target folder itself is only updated
    /// after the engine accepted the job.
    pub async fn submit_streams(
        &self,
        input_folder_id: DbId,
        streams: &[ResultStream],
        mask_rect: &Value,
    ) -> Result<JobHandle, PipelineError> {
        let mask_rect = MaskRect::from_json(mask_rect)?;
        validate_streams(streams)?;

        let input = self.find_folder(input_folder_id).await?;
        let target_id = input.parent_id.ok_or_else(|| {
            PipelineError::Validation(format!("Input folder {input_folder_id} has no parent"))
        })?;
        let target = self.find_folder(target_id).await?;

        let output = self.folders.ensure_child(&target, OUTPUT_FOLDER_NAME).await?;
        let mut destinations = Vec::with_capacity(streams.len());
        for stream in streams {
            let folder = self.folders.ensure_child(&output, &stream.folder_name).await?;
            destinations.push((stream, folder.id));
        }

        let job = build_job(&self.config, &target, &input, &destinations, &mask_rect);
        let handle = self.engine.submit(&job).await.inspect_err(|e| {
            tracing::error!(
                target_id = %target.id,
                error = %e,
                "Engine rejected timelapse job",
            );
        })?;

        let record = SubmissionRecord {
            job_id: handle.job_id,
            mask_rect,
            output_folder_id: output.id,
            streams: streams.iter().map(|s| s.name.clone()).collect(),
        };
        if !self.folders.record_submission(target.id, &record).await? {
            tracing::warn!(
                target_id = %target.id,
                job_id = %handle.job_id,
                "Target folder vanished before the submission was recorded",
            );
        }

        tracing::info!(
            job_id = %handle.job_id,
            target_id = %target.id,
            streams = streams.len(),
            "Timelapse job queued",
        );
        Ok(handle)
    }

    async fn find_folder(&self, id: DbId) -> Result<Folder, PipelineError> {
        self.folders
            .find_by_id(id)
            .await?
            .ok_or(PipelineError::NotFound {
                entity: "folder",
                id,
            })
    }
}

fn validate_streams(streams: &[ResultStream]) -> Result<(), PipelineError> {
    if streams.is_empty() {
        return Err(PipelineError::Validation(
            "At least one result stream is required".into(),
        ));
    }
    for (i, stream) in streams.iter().enumerate() {
        if stream.name.is_empty() {
            return Err(PipelineError::Validation("Result stream name is empty".into()));
        }
        if streams[..i].iter().any(|s| s.name == stream.name) {
            return Err(PipelineError::Validation(format!(
                "Duplicate result stream: {}",
                stream.name
            )));
        }
    }
    Ok(())
}

/// Args are `<flag> <volume>` per stream, then `--mask-rect x1,y1,x2,y2`,
/// then the input volume.
fn build_job(
    config: &SubmitterConfig,
    target: &Folder,
    input: &Folder,
    destinations: &[(&ResultStream, DbId)],
    mask_rect: &MaskRect,
) -> ContainerJob {
    let mut job = ContainerJob::new(
        config.image.clone(),
        job_title(&target.name),
        target.id,
        InputVolume::read_only(input.id, INPUT_FOLDER_NAME),
    )
    .pull_image(config.pull_image);

    for (stream, folder_id) in destinations {
        job = job.literal(stream.flag.clone()).volume(stream.volume.clone());
        let reference = Correlation::stream_append(target.id, stream.name.clone())
            .encode()
            .unwrap_or_default();
        job = job.hook(ResultHook {
            volume: stream.volume.clone(),
            folder_id: *folder_id,
            reference,
        });
    }

    job.literal("--mask-rect")
        .literal(mask_rect.to_arg())
        .input_arg()
}
