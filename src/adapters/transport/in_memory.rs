//! In-memory socket transport for testing.
//!
//! Records every frame per connection and every close, and can be told to
//! fail sends for chosen connections.
//!
//! # Security Note
//!
//! This adapter is for **testing only**. It uses `.expect()` on lock
//! operations which will panic if locks are poisoned.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::domain::foundation::ConnectionId;
use crate::ports::{SocketFrame, SocketTransport, TransportError};

/// Transport that captures traffic instead of writing to sockets.
///
/// # Example
///
/// ```ignore
/// let transport = Arc::new(InMemoryTransport::new());
/// server.emit_to_client(&conn, "typing", &json!({})).await?;
/// assert_eq!(transport.frames_for(&conn).len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryTransport {
    frames: RwLock<HashMap<ConnectionId, Vec<SocketFrame>>>,
    closed: RwLock<Vec<ConnectionId>>,
    failing: RwLock<HashSet<ConnectionId>>,
}

impl InMemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    // === Test Helpers ===

    /// Makes every later send to `connection_id` fail with `ConnectionClosed`.
    pub fn fail_for(&self, connection_id: &ConnectionId) {
        self.failing
            .write()
            .expect("InMemoryTransport: failing lock poisoned")
            .insert(connection_id.clone());
    }

    /// Frames delivered to one connection, in send order.
    pub fn frames_for(&self, connection_id: &ConnectionId) -> Vec<SocketFrame> {
        self.frames
            .read()
            .expect("InMemoryTransport: frames lock poisoned")
            .get(connection_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Frames delivered to one connection under a given wire method.
    pub fn frames_with_event(&self, connection_id: &ConnectionId, event: &str) -> Vec<SocketFrame> {
        self.frames_for(connection_id)
            .into_iter()
            .filter(|frame| frame.event == event)
            .collect()
    }

    /// Connections that received at least one frame.
    pub fn recipients(&self) -> HashSet<ConnectionId> {
        self.frames
            .read()
            .expect("InMemoryTransport: frames lock poisoned")
            .iter()
            .filter(|(_, frames)| !frames.is_empty())
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Whether `close` was called for a connection.
    pub fn was_closed(&self, connection_id: &ConnectionId) -> bool {
        self.closed
            .read()
            .expect("InMemoryTransport: closed lock poisoned")
            .contains(connection_id)
    }

    /// Forgets all recorded frames.
    pub fn clear(&self) {
        self.frames
            .write()
            .expect("InMemoryTransport: frames lock poisoned")
            .clear();
    }
}

#[async_trait]
impl SocketTransport for InMemoryTransport {
    async fn send(
        &self,
        connection_id: &ConnectionId,
        frame: Arc<SocketFrame>,
    ) -> Result<(), TransportError> {
        let failing = self
            .failing
            .read()
            .expect("InMemoryTransport: failing lock poisoned")
            .contains(connection_id);
        if failing {
            return Err(TransportError::ConnectionClosed(connection_id.clone()));
        }
        self.frames
            .write()
            .expect("InMemoryTransport: frames lock poisoned")
            .entry(connection_id.clone())
            .or_default()
            .push(frame.as_ref().clone());
        Ok(())
    }

    async fn close(&self, connection_id: &ConnectionId) {
        self.closed
            .write()
            .expect("InMemoryTransport: closed lock poisoned")
            .push(connection_id.clone());
    }
}
