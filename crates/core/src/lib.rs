//! Domain types shared across the lapse workspace.
//!
//! Nothing in here performs I/O: identifiers, the job status enum, the
//! validated mask rectangle, the correlation reference carried through the
//! execution engine, naming rules, and a small EXIF reader.

pub mod correlation;
pub mod error;
pub mod exif;
pub mod job_status;
pub mod mask_rect;
pub mod naming;
pub mod types;

pub use correlation::Correlation;
pub use error::CoreError;
pub use job_status::JobStatus;
pub use mask_rect::MaskRect;
