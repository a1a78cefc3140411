//! WebSocket client for the engine's notification channel.
//!
//! [`NotificationClient`] holds the endpoint configuration. Call
//! [`NotificationClient::connect`] to establish a live
//! [`NotificationConnection`].

use tokio_tungstenite::{connect_async, MaybeTlsStream};

/// Configuration handle for the notification endpoint.
#[derive(Debug, Clone)]
pub struct NotificationClient {
    ws_url: String,
}

/// A live WebSocket connection to the engine.
pub struct NotificationConnection {
    /// Unique client ID sent during the WebSocket handshake.
    pub client_id: String,
    /// The raw WebSocket stream for reading/writing frames.
    pub ws_stream: tokio_tungstenite::WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>,
}

impl NotificationClient {
    /// * `ws_url` - WebSocket base URL, e.g. `ws://engine:8080`.
    pub fn new(ws_url: String) -> Self {
        Self { ws_url }
    }

    pub fn ws_url(&self) -> &str {
        &self.ws_url
    }

    /// Connect to the engine's `/notifications` endpoint.
    ///
    /// A fresh `client_id` (UUID v4) is sent as a query parameter so the
    /// engine can tell reconnects apart.
    pub async fn connect(&self) -> Result<NotificationConnection, ClientError> {
        let client_id = uuid::Uuid::new_v4().to_string();
        let url = format!("{}/notifications?clientId={}", self.ws_url, client_id);

        let (ws_stream, _response) = connect_async(&url).await.map_err(|e| {
            ClientError::Connection(format!(
                "Failed to connect to engine at {}: {e}",
                self.ws_url
            ))
        })?;

        tracing::info!(
            client_id = %client_id,
            "Connected to engine notifications at {}",
            self.ws_url,
        );

        Ok(NotificationConnection {
            client_id,
            ws_stream,
        })
    }
}

/// Errors that can occur when working with the WebSocket client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Failed to establish the WebSocket connection.
    #[error("Connection error: {0}")]
    Connection(String),
}
