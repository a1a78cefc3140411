//! Execution engine client library.
//!
//! Describes containerized jobs, submits them over HTTP, and listens on
//! the engine's notification WebSocket for uploads and status changes,
//! which are republished on the shared event bus.

pub mod api;
pub mod client;
pub mod container;
pub mod engine;
pub mod listener;
pub mod messages;
pub mod processor;

pub use api::EngineApi;
pub use client::NotificationClient;
pub use container::{ContainerArg, ContainerJob, InputVolume, ResultHook, VolumePath};
pub use engine::{EngineError, ExecutionEngine, JobHandle};
pub use listener::{Backoff, NotificationListener};
