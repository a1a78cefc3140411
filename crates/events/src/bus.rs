//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the central publish/subscribe hub for [`PlatformEvent`]s.
//! It is designed to be shared via `Arc<EventBus>` across the application.
//! Consumers usually take a typed [`Subscription`] rather than the raw
//! receiver.

use std::marker::PhantomData;

use tokio::sync::broadcast::{self, error::RecvError};

use crate::event::{EventKind, PlatformEvent};

/// Default buffer capacity for the broadcast channel.
pub const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// Wraps a [`broadcast::Sender`] so that any number of subscribers can
/// independently receive every published [`PlatformEvent`].
///
/// # Usage
///
/// ```rust
/// use lapse_events::{EventBus, JobUpdated};
///
/// let bus = EventBus::default();
/// let mut jobs = bus.subscribe_to::<JobUpdated>();
///
/// bus.publish(JobUpdated {
///     job_id: uuid::Uuid::now_v7(),
///     target_id: None,
///     status: None,
/// });
/// ```
#[derive(Debug)]
pub struct EventBus {
    sender: broadcast::Sender<PlatformEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no active subscribers the event is silently dropped.
    pub fn publish(&self, event: impl Into<PlatformEvent>) {
        // Ignore the SendError — it only means there are zero receivers.
        let _ = self.sender.send(event.into());
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<PlatformEvent> {
        self.sender.subscribe()
    }

    /// Subscribe to a single payload kind.
    pub fn subscribe_to<T: EventKind>(&self) -> Subscription<T> {
        Subscription {
            rx: self.sender.subscribe(),
            _kind: PhantomData,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// A receiver yielding only payloads of kind `T`.
#[derive(Debug)]
pub struct Subscription<T> {
    rx: broadcast::Receiver<PlatformEvent>,
    _kind: PhantomData<fn() -> T>,
}

impl<T: EventKind> Subscription<T> {
    /// Wait for the next `T`, skipping other kinds.
    ///
    /// Returns `None` once the bus is dropped. A lagging receiver logs the
    /// number of events it lost and keeps going.
    pub async fn recv(&mut self) -> Option<T> {
        loop {
            match self.rx.recv().await {
                Ok(event) => {
                    if let Some(payload) = T::select(&event) {
                        return Some(payload);
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::error!(
                        kind = T::NAME,
                        skipped,
                        "Subscriber lagged behind the event bus; events were dropped",
                    );
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
