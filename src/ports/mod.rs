//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the routing core and the outside world. Adapters implement these ports.
//!
//! ## Substrate Ports
//!
//! - `SocketTransport` - Deliver frames to and close individual connections
//! - `IdentityResolver` - Resolve the user behind a handshake
//! - `LifecycleHooks` - Application callbacks on connect/disconnect
//!
//! ## Routing Ports
//!
//! - `ConnectionRegistry` - Connection, user and room indexes
//! - `InboundPublisher` - Bus for stamped inbound envelopes
//! - `DeliveryErrorHandler` - Sink for outbound delivery failures
//!
//! ## Handler Ports
//!
//! - `SocketCommandHandler` - Named command bound to the sender identity
//! - `SocketEventHandler` - Named event bound to the sender identity

mod command_handler;
mod connection_registry;
mod delivery_error_handler;
mod identity_resolver;
mod inbound_bus;
mod lifecycle_hooks;
mod socket_transport;

pub use command_handler::{SocketCommandHandler, SocketEventHandler};
pub use connection_registry::{ConnectionRegistry, ConnectionRegistryError};
pub use delivery_error_handler::{DeliveryError, DeliveryErrorHandler, LoggingDeliveryErrorHandler};
pub use identity_resolver::{Handshake, IdentityResolver};
pub use inbound_bus::InboundPublisher;
pub use lifecycle_hooks::{LifecycleHooks, NoopHooks};
pub use socket_transport::{SocketFrame, SocketTransport, TransportError};
