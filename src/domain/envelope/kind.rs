//! Wire method names and the three envelope kinds.
//!
//! Method names are protocol constants and stable across versions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sent once per successful handshake.
pub const TRANSPORT_SOCKET_CONNECTED: &str = "TRANSPORT_SOCKET_CONNECTED";

/// Sent once on handshake failure, right before the link is closed.
pub const TRANSPORT_SOCKET_EXCEPTION: &str = "TRANSPORT_SOCKET_EXCEPTION";

/// Fire-and-forget event.
pub const TRANSPORT_SOCKET_EVENT: &str = "TRANSPORT_SOCKET_EVENT";

/// Command request.
pub const TRANSPORT_SOCKET_COMMAND_REQUEST_METHOD: &str = "TRANSPORT_SOCKET_COMMAND_REQUEST_METHOD";

/// Command response.
pub const TRANSPORT_SOCKET_COMMAND_RESPONSE_METHOD: &str =
    "TRANSPORT_SOCKET_COMMAND_RESPONSE_METHOD";

/// Kind of envelope carried by a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvelopeKind {
    Event,
    Request,
    Response,
}

impl EnvelopeKind {
    /// Wire method the kind travels under.
    pub fn method(&self) -> &'static str {
        match self {
            EnvelopeKind::Event => TRANSPORT_SOCKET_EVENT,
            EnvelopeKind::Request => TRANSPORT_SOCKET_COMMAND_REQUEST_METHOD,
            EnvelopeKind::Response => TRANSPORT_SOCKET_COMMAND_RESPONSE_METHOD,
        }
    }

    /// Maps an inbound wire method to a kind. Other methods have no listener.
    pub fn from_method(method: &str) -> Option<Self> {
        match method {
            TRANSPORT_SOCKET_EVENT => Some(EnvelopeKind::Event),
            TRANSPORT_SOCKET_COMMAND_REQUEST_METHOD => Some(EnvelopeKind::Request),
            TRANSPORT_SOCKET_COMMAND_RESPONSE_METHOD => Some(EnvelopeKind::Response),
            _ => None,
        }
    }
}

impl fmt::Display for EnvelopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EnvelopeKind::Event => "event",
            EnvelopeKind::Request => "request",
            EnvelopeKind::Response => "response",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_round_trips_for_every_kind() {
        for kind in [EnvelopeKind::Event, EnvelopeKind::Request, EnvelopeKind::Response] {
            assert_eq!(EnvelopeKind::from_method(kind.method()), Some(kind));
        }
    }

    #[test]
    fn notifications_are_not_inbound_kinds() {
        assert_eq!(EnvelopeKind::from_method(TRANSPORT_SOCKET_CONNECTED), None);
        assert_eq!(EnvelopeKind::from_method(TRANSPORT_SOCKET_EXCEPTION), None);
        assert_eq!(EnvelopeKind::from_method("ping"), None);
    }
}
