//! WebSocket substrate adapter.
//!
//! # Architecture
//!
//! ```text
//!   client ──ws──> ws_handler ──Handshake──> SocketServer::handle_connection
//!                      │
//!                      ├── reader task ──SocketFrame──> SocketServer::handle_frame
//!                      │
//!                      └── writer task <──mpsc── WebSocketTransport::send / close
//! ```
//!
//! # Components
//!
//! - [`transport`] - `SocketTransport` backed by per-connection queues
//! - [`handler`] - Axum WebSocket upgrade handler and router

pub mod handler;
pub mod transport;

pub use handler::{socket_router, ws_handler, WebSocketState};
pub use transport::{Outgoing, WebSocketTransport};
