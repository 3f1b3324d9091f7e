//! Inbound dispatcher: wire payload to stamped envelope on the bus.

use std::sync::Arc;

use serde_json::Value;

use crate::domain::connection::SocketUser;
use crate::domain::envelope::{
    EnvelopeKind, EventEnvelope, InboundMessage, RequestEnvelope, ResponseEnvelope,
};
use crate::ports::InboundPublisher;

/// Parses, stamps and publishes inbound envelopes.
#[derive(Clone)]
pub struct InboundDispatcher {
    publisher: Arc<dyn InboundPublisher>,
}

impl InboundDispatcher {
    pub fn new(publisher: Arc<dyn InboundPublisher>) -> Self {
        Self { publisher }
    }

    /// Returns whether anything was published. Malformed envelopes are
    /// dropped silently.
    pub async fn dispatch(&self, sender: &SocketUser, kind: EnvelopeKind, payload: Value) -> bool {
        let Some(message) = stamp(sender, kind, payload) else {
            tracing::debug!(
                connection_id = %sender.client_id,
                kind = %kind,
                "Dropping envelope without correlation id"
            );
            return false;
        };
        self.publisher.publish(message).await;
        true
    }
}

fn stamp(sender: &SocketUser, kind: EnvelopeKind, payload: Value) -> Option<InboundMessage> {
    let message = match kind {
        EnvelopeKind::Event => {
            let mut event = EventEnvelope::from_wire(payload)?;
            event.stamp(sender);
            InboundMessage::Event(event)
        }
        EnvelopeKind::Request => {
            let mut request = RequestEnvelope::from_wire(payload)?;
            request.stamp(sender);
            InboundMessage::Request(request)
        }
        EnvelopeKind::Response => {
            let mut response = ResponseEnvelope::from_wire(payload)?;
            response.stamp(sender);
            InboundMessage::Response(response)
        }
    };
    Some(message)
}
