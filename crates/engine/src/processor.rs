//! WebSocket message processing loop.
//!
//! Reads raw frames from the engine's notification connection, parses
//! them into typed [`EngineMessage`] variants, and republishes the
//! relevant ones on the [`EventBus`].

use futures::{Stream, StreamExt};
use lapse_events::EventBus;
use tokio_tungstenite::tungstenite::{self, Message};

use crate::messages::{parse_message, EngineMessage};

/// Process notification frames until the stream closes or errors.
///
/// Each text frame is parsed via [`parse_message`]; uploads and job status
/// changes are published on `bus`, everything else is logged.
pub async fn process_messages<S>(ws_stream: &mut S, bus: &EventBus)
where
    S: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
{
    while let Some(msg_result) = ws_stream.next().await {
        match msg_result {
            Ok(Message::Text(text)) => handle_text_message(text.as_str(), bus),
            Ok(Message::Binary(_)) => {
                tracing::trace!("Ignoring binary notification frame");
            }
            Ok(Message::Ping(_) | Message::Pong(_)) => {
                // Handled automatically by tungstenite.
            }
            Ok(Message::Close(frame)) => {
                tracing::info!(?frame, "Engine notification socket closed");
                break;
            }
            Ok(Message::Frame(_)) => {}
            Err(e) => {
                tracing::error!(error = %e, "WebSocket receive error");
                break;
            }
        }
    }
}

/// Dispatch a single text frame.
pub fn handle_text_message(text: &str, bus: &EventBus) {
    match parse_message(text) {
        Ok(EngineMessage::UploadFinalized(upload)) => {
            tracing::debug!(
                file_id = %upload.file_id,
                item_id = %upload.item_id,
                name = %upload.name,
                has_reference = upload.reference.is_some(),
                "Upload finalized",
            );
            bus.publish(upload);
        }
        Ok(EngineMessage::JobStatus(update)) => {
            tracing::debug!(
                job_id = %update.job_id,
                status = ?update.status,
                "Job status notification",
            );
            bus.publish(update);
        }
        Ok(EngineMessage::Heartbeat(data)) => {
            tracing::trace!(queue_remaining = data.queue_remaining, "Engine heartbeat");
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                raw_message = %text,
                "Failed to parse engine notification",
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use lapse_core::JobStatus;
    use lapse_events::{EventPayload, JobUpdated};

    use super::*;

    #[tokio::test]
    async fn forwards_frames_to_bus_until_close() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        let job_id = uuid::Uuid::now_v7();
        let frames = vec![
            Ok(Message::Text(
                format!(r#"{{"type":"job_status","data":{{"jobId":"{job_id}","status":"SUCCESS"}}}}"#)
                    .into(),
            )),
            Ok(Message::Text(r#"{"type":"heartbeat","data":{}}"#.into())),
            Ok(Message::Text("garbage".into())),
            Ok(Message::Close(None)),
            Ok(Message::Text(
                format!(r#"{{"type":"job_status","data":{{"jobId":"{job_id}","status":"ERROR"}}}}"#)
                    .into(),
            )),
        ];
        let mut stream = futures::stream::iter(frames);

        process_messages(&mut stream, &bus).await;

        let event = rx.recv().await.unwrap();
        assert_eq!(
            event.payload,
            EventPayload::Job(JobUpdated {
                job_id,
                target_id: None,
                status: Some(JobStatus::Success),
            })
        );
        // Nothing after the close frame was forwarded.
        assert!(rx.try_recv().is_err());
    }
}
