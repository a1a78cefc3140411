//! Timelapse job orchestration.
//!
//! - [`JobSubmitter`] builds and queues the container job.
//! - [`ResultCorrelator`] routes finalized uploads back to their item or
//!   target folder.
//! - [`StatusPropagator`] mirrors job status onto the target folder.
//! - [`ReferenceCounter`] keeps study series counts current.
//!
//! The three consumers are driven from the event bus by [`runtime`].

pub mod collaborators;
pub mod correlator;
pub mod counter;
pub mod error;
pub mod library;
pub mod runtime;
pub mod status;
pub mod submitter;

pub use correlator::{CorrelationOutcome, ResultCorrelator};
pub use counter::ReferenceCounter;
pub use error::PipelineError;
pub use library::TimelapseLibrary;
pub use runtime::Consumers;
pub use status::StatusPropagator;
pub use submitter::{JobSubmitter, ResultStream, SubmitterConfig};
