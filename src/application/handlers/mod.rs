//! Built-in socket command handlers.

mod room;

pub use room::{ensure_not_reserved, RoomAction, RoomCommand, RoomHandler, RoomKey, ROOM_COMMAND_NAME};
