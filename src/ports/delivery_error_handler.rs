//! DeliveryErrorHandler port - Where outbound delivery failures end up.
//!
//! Outbound sends never raise delivery failures to the caller. The messenger
//! reports them here, once per failed emit, split by envelope kind.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::envelope::{EventEnvelope, RequestEnvelope, ResponseEnvelope};
use crate::domain::foundation::ConnectionId;

use super::TransportError;

/// Outcome of a fan-out in which at least one send did not go through.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Failed to serialize payload: {0}")]
    Serialization(String),

    #[error("Delivered to {delivered} connection(s), {} failed", .failures.len())]
    Partial {
        delivered: usize,
        failures: Vec<(ConnectionId, TransportError)>,
    },
}

impl DeliveryError {
    /// Connections the frame did not reach.
    pub fn failed_connections(&self) -> Vec<&ConnectionId> {
        match self {
            DeliveryError::Partial { failures, .. } => failures.iter().map(|(id, _)| id).collect(),
            _ => Vec::new(),
        }
    }
}

/// Port receiving delivery failures, one method per envelope kind.
///
/// Defaults log through `tracing` and swallow the error.
#[async_trait]
pub trait DeliveryErrorHandler: Send + Sync {
    async fn on_event_error(&self, event: &EventEnvelope, error: &DeliveryError) {
        tracing::warn!(event = %event.name, uid = %event.uid, "Event delivery failed: {}", error);
    }

    async fn on_request_error(&self, request: &RequestEnvelope, error: &DeliveryError) {
        tracing::warn!(
            command = %request.name,
            request_id = %request.id,
            "Request delivery failed: {}",
            error
        );
    }

    async fn on_response_error(&self, response: &ResponseEnvelope, error: &DeliveryError) {
        tracing::warn!(
            command = %response.name,
            request_id = %response.id,
            "Response delivery failed: {}",
            error
        );
    }
}

/// Handler that only logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingDeliveryErrorHandler;

impl DeliveryErrorHandler for LoggingDeliveryErrorHandler {}
