//! Connection module - live links, their lifecycle, and room naming.

#[allow(clippy::module_inception)]
mod connection;
mod room;
mod state;

pub use connection::{Connection, SocketUser};
pub use room::{is_reserved_name, RoomName};
pub use state::ConnectionState;
