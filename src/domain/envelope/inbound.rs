//! Stamped inbound traffic as published on the bus.

use crate::domain::connection::SocketUser;

use super::{EnvelopeKind, EventEnvelope, RequestEnvelope, ResponseEnvelope};

/// One stamped envelope received from an Active connection.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    Event(EventEnvelope),
    Request(RequestEnvelope),
    Response(ResponseEnvelope),
}

impl InboundMessage {
    pub fn kind(&self) -> EnvelopeKind {
        match self {
            InboundMessage::Event(_) => EnvelopeKind::Event,
            InboundMessage::Request(_) => EnvelopeKind::Request,
            InboundMessage::Response(_) => EnvelopeKind::Response,
        }
    }

    /// Identity stamped on ingress.
    pub fn sender(&self) -> Option<SocketUser> {
        match self {
            InboundMessage::Event(e) => e.sender(),
            InboundMessage::Request(r) => r.sender(),
            InboundMessage::Response(r) => r.sender(),
        }
    }
}

impl From<EventEnvelope> for InboundMessage {
    fn from(envelope: EventEnvelope) -> Self {
        InboundMessage::Event(envelope)
    }
}

impl From<RequestEnvelope> for InboundMessage {
    fn from(envelope: RequestEnvelope) -> Self {
        InboundMessage::Request(envelope)
    }
}

impl From<ResponseEnvelope> for InboundMessage {
    fn from(envelope: ResponseEnvelope) -> Self {
        InboundMessage::Response(envelope)
    }
}
