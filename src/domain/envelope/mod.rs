//! Message envelope protocol.
//!
//! Three envelope kinds travel over a connection, each under its own wire
//! method:
//!
//! ```text
//! TRANSPORT_SOCKET_EVENT                    -> EventEnvelope    (uid)
//! TRANSPORT_SOCKET_COMMAND_REQUEST_METHOD   -> RequestEnvelope  (id, options)
//! TRANSPORT_SOCKET_COMMAND_RESPONSE_METHOD  -> ResponseEnvelope (id, clientId)
//! ```
//!
//! Inbound envelopes are parsed leniently and then stamped with the sender's
//! bound identity. Outbound envelopes are addressed through [`Target`].

mod event;
mod inbound;
mod kind;
mod notification;
mod request;
mod response;
mod target;
mod wire;

pub use event::{EventEnvelope, EventOptions};
pub use inbound::InboundMessage;
pub use kind::{
    EnvelopeKind, TRANSPORT_SOCKET_COMMAND_REQUEST_METHOD,
    TRANSPORT_SOCKET_COMMAND_RESPONSE_METHOD, TRANSPORT_SOCKET_CONNECTED, TRANSPORT_SOCKET_EVENT,
    TRANSPORT_SOCKET_EXCEPTION,
};
pub use notification::{ConnectedMessage, ErrorMessage};
pub use request::{CommandOptions, RequestEnvelope};
pub use response::{ErrorDescription, ResponseEnvelope, ResponseOutcome};
pub use target::{AddressingError, Target};
