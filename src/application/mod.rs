//! Application layer - Routing services and the socket server facade.
//!
//! This layer orchestrates domain types and coordinates between ports:
//!
//! - `LifecycleController` - Handshake, frame gating, disconnect
//! - `InboundDispatcher` - Parse, stamp and publish inbound envelopes
//! - `AddressingResolver` / `OutboundGateway` - Target resolution and fan-out
//! - `SocketMessenger` - Validated outbound envelope construction
//! - `CommandRouter` - Named command/event handlers fed from the bus
//! - `SocketServer` - Facade tying everything together

mod addressing;
mod command_router;
mod dispatcher;
mod gateway;
pub mod handlers;
mod lifecycle;
mod messenger;
mod server;

pub use addressing::AddressingResolver;
pub use command_router::CommandRouter;
pub use dispatcher::InboundDispatcher;
pub use gateway::{DeliveryReport, OutboundGateway};
pub use lifecycle::{HandshakeError, LifecycleController};
pub use messenger::SocketMessenger;
pub use server::{SocketServer, SocketServerBuilder};
