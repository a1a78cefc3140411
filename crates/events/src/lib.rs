//! Lapse event bus.
//!
//! - [`EventBus`] — in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`PlatformEvent`] — envelope around the tagged [`EventPayload`].
//! - [`Subscription`] — typed receiver for one payload kind.

pub mod bus;
pub mod event;

pub use bus::{EventBus, Subscription};
pub use event::{
    EventKind, EventPayload, ItemEvent, ItemLifecycle, JobUpdated, PlatformEvent, UploadFinalized,
};
