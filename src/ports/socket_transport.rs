//! SocketTransport port - Interface to the connection substrate.
//!
//! The routing layer never touches sockets directly. It hands serialized
//! frames to a transport keyed by [`ConnectionId`] and asks it to close
//! links it has rejected or administratively disconnected.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::domain::foundation::ConnectionId;

/// One wire frame: a method name and its JSON payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocketFrame {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

impl SocketFrame {
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }
}

/// Errors raised by a transport when a frame cannot be handed off.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Connection {0} is closed")]
    ConnectionClosed(ConnectionId),

    #[error("Unknown connection {0}")]
    UnknownConnection(ConnectionId),

    #[error("Outbound queue full for connection {0}")]
    QueueFull(ConnectionId),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Port for delivering frames to, and closing, individual connections.
///
/// Implementations must be safe to call concurrently for different
/// connections. A frame is shared across a fan-out, so it is passed as
/// `Arc` and serialized at most once per call site.
#[async_trait]
pub trait SocketTransport: Send + Sync {
    /// Queue a frame for one connection.
    async fn send(&self, connection_id: &ConnectionId, frame: Arc<SocketFrame>)
        -> Result<(), TransportError>;

    /// Force a connection closed. Closing an unknown connection is a no-op.
    async fn close(&self, connection_id: &ConnectionId);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn SocketTransport) {}

    #[test]
    fn frame_uses_event_and_data_fields() {
        let frame = SocketFrame::new("TRANSPORT_SOCKET_EVENT", json!({"uid": "e1"}));
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["event"], "TRANSPORT_SOCKET_EVENT");
        assert_eq!(json["data"]["uid"], "e1");
    }

    #[test]
    fn frame_without_data_defaults_to_null() {
        let frame: SocketFrame = serde_json::from_str(r#"{"event":"X"}"#).unwrap();
        assert_eq!(frame.data, Value::Null);
    }
}
