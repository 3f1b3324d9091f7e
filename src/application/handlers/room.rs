//! Room access command.
//!
//! Lets a client join or leave named rooms with its own connection. The
//! reserved `user<digits>` namespace is off limits: only the handshake
//! puts a connection in its user room.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::connection::{is_reserved_name, RoomName, SocketUser};
use crate::domain::foundation::DomainError;
use crate::ports::{ConnectionRegistry, SocketCommandHandler};

/// Wire name of the room command.
pub const ROOM_COMMAND_NAME: &str = "TransportSocketRoomCommand";

/// Room key as sent by clients: any JSON string or number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RoomKey {
    Name(String),
    Number(serde_json::Number),
}

impl fmt::Display for RoomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoomKey::Name(name) => write!(f, "{}", name),
            RoomKey::Number(number) => write!(f, "{}", number),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomAction {
    Add,
    Remove,
}

/// Arguments of [`ROOM_COMMAND_NAME`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomCommand {
    pub name: RoomKey,
    pub action: RoomAction,
}

/// Fails with `FORBIDDEN` for names in the reserved user namespace.
pub fn ensure_not_reserved(name: &str) -> Result<(), DomainError> {
    if is_reserved_name(name) {
        return Err(DomainError::forbidden(format!("Forbidden \"{}\" room", name)));
    }
    Ok(())
}

/// Handles [`RoomCommand`] for the requesting connection.
pub struct RoomHandler {
    registry: Arc<dyn ConnectionRegistry>,
}

impl RoomHandler {
    pub fn new(registry: Arc<dyn ConnectionRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl SocketCommandHandler for RoomHandler {
    type Request = RoomCommand;
    type Response = ();

    fn name(&self) -> &str {
        ROOM_COMMAND_NAME
    }

    async fn execute(&self, request: RoomCommand, user: &SocketUser) -> Result<(), DomainError> {
        let name = request.name.to_string();
        ensure_not_reserved(&name)?;
        let room = RoomName::new(name)?;

        match request.action {
            RoomAction::Add => {
                self.registry.join(&user.client_id, &room).await?;
                tracing::debug!(connection_id = %user.client_id, room = %room, "Joined room");
            }
            RoomAction::Remove => {
                self.registry.leave(&user.client_id, &room).await;
                tracing::debug!(connection_id = %user.client_id, room = %room, "Left room");
            }
        }
        Ok(())
    }
}
