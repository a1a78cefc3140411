//! Bus wiring for the pipeline consumers.
//!
//! Each consumer gets its own typed subscription and a loop that applies
//! events one at a time, in the order they were published. A loop stops
//! when the token is cancelled or the bus is dropped. Cancellation is only
//! observed between events, so a write that has started always completes
//! before the loop's handle resolves.

use std::sync::Arc;

use async_trait::async_trait;
use lapse_events::{EventBus, EventKind, ItemEvent, JobUpdated, UploadFinalized};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::correlator::ResultCorrelator;
use crate::counter::ReferenceCounter;
use crate::status::StatusPropagator;

/// Something that reacts to events of kind `T`.
///
/// Errors are the consumer's to log; nothing is returned to the bus.
#[async_trait]
pub trait Consumer<T: EventKind>: Send + Sync + 'static {
    async fn consume(&self, event: T);
}

#[async_trait]
impl Consumer<UploadFinalized> for ResultCorrelator {
    async fn consume(&self, event: UploadFinalized) {
        if let Err(e) = self.handle(&event).await {
            tracing::error!(
                file_id = %event.file_id,
                item_id = %event.item_id,
                error = %e,
                "Failed to correlate upload",
            );
        }
    }
}

#[async_trait]
impl Consumer<JobUpdated> for StatusPropagator {
    async fn consume(&self, event: JobUpdated) {
        if let Err(e) = self.handle(&event).await {
            tracing::error!(job_id = %event.job_id, error = %e, "Failed to propagate job status");
        }
    }
}

#[async_trait]
impl Consumer<ItemEvent> for ReferenceCounter {
    async fn consume(&self, event: ItemEvent) {
        if let Err(e) = self.handle(&event).await {
            tracing::error!(error = %e, ?event, "Failed to adjust series count");
        }
    }
}

/// Subscribe `consumer` to `T` events and drive it in the background.
///
/// The subscription is taken before this returns, so anything published
/// afterwards is delivered. Each event is fully consumed before the next
/// is received.
pub fn spawn_consumer<T, C>(
    bus: &EventBus,
    consumer: Arc<C>,
    cancel: CancellationToken,
) -> JoinHandle<()>
where
    T: EventKind,
    C: Consumer<T>,
{
    let mut subscription = bus.subscribe_to::<T>();
    tokio::spawn(async move {
        tracing::debug!(kind = T::NAME, "Consumer started");
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                next = subscription.recv() => {
                    let Some(event) = next else { break };
                    consumer.consume(event).await;
                }
            }
        }
        tracing::debug!(kind = T::NAME, "Consumer stopped");
    })
}

/// The three pipeline consumers.
pub struct Consumers {
    pub correlator: Arc<ResultCorrelator>,
    pub status: Arc<StatusPropagator>,
    pub counter: Arc<ReferenceCounter>,
}

impl Consumers {
    /// Start all three loops on `bus`.
    pub fn spawn(self, bus: &EventBus, cancel: &CancellationToken) -> Vec<JoinHandle<()>> {
        vec![
            spawn_consumer::<UploadFinalized, _>(bus, self.correlator, cancel.child_token()),
            spawn_consumer::<JobUpdated, _>(bus, self.status, cancel.child_token()),
            spawn_consumer::<ItemEvent, _>(bus, self.counter, cancel.child_token()),
        ]
    }
}
