//! Long-lived engine notification listener.
//!
//! [`NotificationListener`] keeps one notification socket open at a time
//! and republishes what it hears on the shared [`EventBus`]. Failed
//! connects are retried with a doubling delay; a connection that was
//! established starts the next round from the initial delay again. Shut it
//! down by cancelling its token.

use std::sync::Arc;
use std::time::Duration;

use lapse_events::EventBus;
use tokio_util::sync::CancellationToken;

use crate::client::NotificationClient;
use crate::processor::process_messages;

/// Retry delays between failed connects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub initial: Duration,
    pub max: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            initial: Duration::from_secs(1),
            max: Duration::from_secs(30),
        }
    }
}

impl Backoff {
    /// Delay to use after `current`: doubled, capped at `max`.
    pub fn after(&self, current: Duration) -> Duration {
        current.saturating_mul(2).min(self.max)
    }
}

/// Background task bridging engine notifications onto the bus.
pub struct NotificationListener {
    client: NotificationClient,
    bus: Arc<EventBus>,
    backoff: Backoff,
}

impl NotificationListener {
    pub fn new(client: NotificationClient, bus: Arc<EventBus>) -> Self {
        Self {
            client,
            bus,
            backoff: Backoff::default(),
        }
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Spawn the listener onto the runtime.
    pub fn spawn(self, cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            tracing::info!(engine = self.client.ws_url(), "Starting notification listener");
            self.run(&cancel).await;
            tracing::info!(engine = self.client.ws_url(), "Notification listener exited");
        })
    }

    /// Listen until `cancel` is triggered, reconnecting whenever the socket
    /// drops or a connect fails.
    pub async fn run(&self, cancel: &CancellationToken) {
        let engine = self.client.ws_url();
        let mut delay = self.backoff.initial;
        let mut failures = 0u32;

        loop {
            let connected = tokio::select! {
                _ = cancel.cancelled() => return,
                result = self.client.connect() => result,
            };

            match connected {
                Ok(conn) => {
                    delay = self.backoff.initial;
                    failures = 0;

                    let client_id = conn.client_id;
                    let mut ws_stream = conn.ws_stream;
                    tokio::select! {
                        _ = cancel.cancelled() => {
                            tracing::info!(engine, %client_id, "Listener cancelled");
                            return;
                        }
                        _ = process_messages(&mut ws_stream, &self.bus) => {}
                    }
                    tracing::warn!(engine, %client_id, "Notification socket closed, reconnecting");
                    continue;
                }
                Err(e) => {
                    failures += 1;
                    tracing::warn!(
                        engine,
                        failures,
                        retry_in_ms = delay.as_millis() as u64,
                        error = %e,
                        "Engine notifications unreachable",
                    );
                }
            }

            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }
            delay = self.backoff.after(delay);
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::{SinkExt, StreamExt};
    use lapse_core::JobStatus;
    use lapse_events::JobUpdated;
    use tokio::net::TcpListener;
    use tokio_tungstenite::tungstenite::Message;

    use super::*;

    #[test]
    fn backoff_doubles_up_to_max() {
        let backoff = Backoff {
            initial: Duration::from_secs(1),
            max: Duration::from_secs(10),
        };
        let mut delay = backoff.initial;
        let mut seen = Vec::new();
        for _ in 0..6 {
            seen.push(delay.as_secs());
            delay = backoff.after(delay);
        }
        assert_eq!(seen, vec![1, 2, 4, 8, 10, 10]);
    }

    #[tokio::test]
    async fn cancelled_listener_exits() {
        let listener = NotificationListener::new(
            NotificationClient::new("ws://127.0.0.1:9".into()),
            Arc::new(EventBus::default()),
        )
        .with_backoff(Backoff {
            initial: Duration::from_millis(10),
            max: Duration::from_millis(20),
        });

        let cancel = CancellationToken::new();
        let handle = listener.spawn(cancel.clone());
        cancel.cancel();

        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("listener did not stop")
            .unwrap();
    }

    #[tokio::test]
    async fn reconnects_after_socket_closes() {
        let server = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = server.local_addr().unwrap();
        let target_id = uuid::Uuid::now_v7();

        // Each accepted socket sends one status frame, then closes.
        tokio::spawn(async move {
            for status in ["RUNNING", "SUCCESS"] {
                let (tcp, _) = server.accept().await.unwrap();
                let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
                let frame = format!(
                    r#"{{"type":"job_status","data":{{"jobId":"{}","targetEntityId":"{target_id}","status":"{status}"}}}}"#,
                    uuid::Uuid::now_v7(),
                );
                ws.send(Message::Text(frame.into())).await.unwrap();
                ws.close(None).await.ok();
                while let Some(Ok(_)) = ws.next().await {}
            }
        });

        let bus = Arc::new(EventBus::default());
        let mut updates = bus.subscribe_to::<JobUpdated>();
        let cancel = CancellationToken::new();
        let handle = NotificationListener::new(
            NotificationClient::new(format!("ws://{addr}")),
            bus.clone(),
        )
        .with_backoff(Backoff {
            initial: Duration::from_millis(10),
            max: Duration::from_millis(20),
        })
        .spawn(cancel.clone());

        let first = tokio::time::timeout(Duration::from_secs(5), updates.recv())
            .await
            .unwrap()
            .unwrap();
        let second = tokio::time::timeout(Duration::from_secs(5), updates.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.status, Some(JobStatus::Running));
        assert_eq!(second.status, Some(JobStatus::Success));
        assert_eq!(second.target_id, Some(target_id));

        cancel.cancel();
        handle.await.unwrap();
    }
}
