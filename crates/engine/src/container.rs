//! Description of a containerized job as submitted to the engine.
//!
//! The engine resolves [`ContainerArg::Volume`] and [`ContainerArg::Input`]
//! placeholders to real paths at run time, mounts the input folder
//! read-only, and after the container exits uploads everything written
//! under each result hook's volume into the hook's destination folder,
//! tagging every upload with the hook's reference string.

use lapse_core::types::DbId;
use serde::{Deserialize, Serialize};

/// A directory inside the engine's scratch volume, e.g. `__output_gifs__/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VolumePath(String);

impl VolumePath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One element of the container's argument list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ContainerArg {
    Literal(String),
    /// Replaced by the host path of a scratch volume.
    Volume(VolumePath),
    /// Replaced by the mount path of the input volume.
    Input,
}

/// Folder mounted into the container as its input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputVolume {
    pub folder_id: DbId,
    /// Directory name the folder is materialized under.
    pub mount_name: String,
    pub read_only: bool,
}

impl InputVolume {
    pub fn read_only(folder_id: DbId, mount_name: impl Into<String>) -> Self {
        Self {
            folder_id,
            mount_name: mount_name.into(),
            read_only: true,
        }
    }
}

/// Upload everything under `volume` into `folder_id`, tagged with `reference`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultHook {
    pub volume: VolumePath,
    pub folder_id: DbId,
    pub reference: String,
}

/// A complete job submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerJob {
    pub image: String,
    pub title: String,
    /// Entity the job's status notifications are reported against.
    pub target_id: DbId,
    pub args: Vec<ContainerArg>,
    pub input: InputVolume,
    pub result_hooks: Vec<ResultHook>,
    /// Whether the engine should pull the image before running.
    pub pull_image: bool,
}

impl ContainerJob {
    pub fn new(
        image: impl Into<String>,
        title: impl Into<String>,
        target_id: DbId,
        input: InputVolume,
    ) -> Self {
        Self {
            image: image.into(),
            title: title.into(),
            target_id,
            args: Vec::new(),
            input,
            result_hooks: Vec::new(),
            pull_image: false,
        }
    }

    pub fn literal(mut self, value: impl Into<String>) -> Self {
        self.args.push(ContainerArg::Literal(value.into()));
        self
    }

    pub fn volume(mut self, path: VolumePath) -> Self {
        self.args.push(ContainerArg::Volume(path));
        self
    }

    pub fn input_arg(mut self) -> Self {
        self.args.push(ContainerArg::Input);
        self
    }

    pub fn hook(mut self, hook: ResultHook) -> Self {
        self.result_hooks.push(hook);
        self
    }

    pub fn pull_image(mut self, pull: bool) -> Self {
        self.pull_image = pull;
        self
    }
}
