//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the routing core to concrete infrastructure:
//! - `events` - Inbound bus (tokio broadcast)
//! - `identity` - Identity resolvers (static token table)
//! - `registry` - Connection registry (in-memory)
//! - `transport` - In-memory transport for tests
//! - `websocket` - Axum WebSocket substrate

pub mod events;
pub mod identity;
pub mod registry;
pub mod transport;
pub mod websocket;

pub use events::BroadcastInboundBus;
pub use identity::StaticTokenResolver;
pub use registry::InMemoryConnectionRegistry;
pub use transport::InMemoryTransport;
pub use websocket::{socket_router, WebSocketState, WebSocketTransport};
