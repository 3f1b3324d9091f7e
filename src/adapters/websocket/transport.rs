//! WebSocket implementation of the `SocketTransport` port.
//!
//! Each attached connection owns a bounded `mpsc` queue drained by its
//! writer task. Sending only enqueues; a full or closed queue is a delivery
//! failure for that connection alone.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, RwLock};

use crate::domain::foundation::ConnectionId;
use crate::ports::{SocketFrame, SocketTransport, TransportError};

/// Work item for a connection's writer task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outgoing {
    /// Serialized frame to write as a text message.
    Frame(String),
    /// Send a close frame and stop writing.
    Close,
}

/// Registry of per-connection outbound queues.
#[derive(Debug)]
pub struct WebSocketTransport {
    clients: RwLock<HashMap<ConnectionId, mpsc::Sender<Outgoing>>>,
    buffer: usize,
}

impl WebSocketTransport {
    /// Creates a transport whose per-connection queues hold `buffer` frames.
    pub fn new(buffer: usize) -> Self {
        Self {
            clients: RwLock::new(HashMap::new()),
            buffer: buffer.max(1),
        }
    }

    /// Opens the outbound queue of a new connection and returns its receiving end.
    pub async fn attach(&self, connection_id: &ConnectionId) -> mpsc::Receiver<Outgoing> {
        let (tx, rx) = mpsc::channel(self.buffer);
        self.clients.write().await.insert(connection_id.clone(), tx);
        rx
    }

    /// Drops the outbound queue of a finished connection.
    pub async fn detach(&self, connection_id: &ConnectionId) {
        self.clients.write().await.remove(connection_id);
    }

    /// Number of attached connections.
    pub async fn client_count(&self) -> usize {
        self.clients.read().await.len()
    }
}

impl Default for WebSocketTransport {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl SocketTransport for WebSocketTransport {
    async fn send(
        &self,
        connection_id: &ConnectionId,
        frame: Arc<SocketFrame>,
    ) -> Result<(), TransportError> {
        let sender = self
            .clients
            .read()
            .await
            .get(connection_id)
            .cloned()
            .ok_or_else(|| TransportError::UnknownConnection(connection_id.clone()))?;
        let text = serde_json::to_string(frame.as_ref())
            .map_err(|e| TransportError::Serialization(e.to_string()))?;

        sender.try_send(Outgoing::Frame(text)).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => TransportError::QueueFull(connection_id.clone()),
            mpsc::error::TrySendError::Closed(_) => {
                TransportError::ConnectionClosed(connection_id.clone())
            }
        })
    }

    async fn close(&self, connection_id: &ConnectionId) {
        let sender = self.clients.write().await.remove(connection_id);
        if let Some(sender) = sender {
            if sender.send(Outgoing::Close).await.is_err() {
                tracing::debug!(connection_id = %connection_id, "Writer already gone on close");
            }
        }
    }
}
