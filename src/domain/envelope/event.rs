//! Event envelope: fire-and-forget notifications.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::domain::connection::{RoomName, SocketUser};
use crate::domain::foundation::{ConnectionId, UserId};

use super::wire;

/// A fire-and-forget notification.
///
/// `uid` only exists to tell real envelopes from empty noise; events are
/// never correlated with replies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventEnvelope {
    pub uid: String,
    pub name: String,
    #[serde(default)]
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<ConnectionId>,
}

impl EventEnvelope {
    /// Creates an outbound event with a fresh uid.
    pub fn new(name: impl Into<String>, data: Value) -> Self {
        Self {
            uid: Uuid::new_v4().to_string(),
            name: name.into(),
            data,
            user_id: None,
            client_id: None,
        }
    }

    /// Parses an inbound payload. `None` for null payloads or a missing `uid`.
    ///
    /// Claimed identity fields are never read; stamping supplies them.
    pub fn from_wire(value: Value) -> Option<Self> {
        let mut fields = wire::fields(value)?;
        let uid = wire::correlation_id(&fields, "uid")?;
        Some(Self {
            uid,
            name: wire::name(&fields),
            data: wire::take(&mut fields, "data"),
            user_id: None,
            client_id: None,
        })
    }

    /// Overwrites the sender identity with the authenticated one.
    pub fn stamp(&mut self, sender: &SocketUser) {
        self.user_id = Some(sender.user_id.clone());
        self.client_id = Some(sender.client_id.clone());
    }

    /// Stamped sender, if any.
    pub fn sender(&self) -> Option<SocketUser> {
        Some(SocketUser::new(self.user_id.clone()?, self.client_id.clone()?))
    }
}

/// Addressing for an outbound event. At most one target; none means
/// broadcast to every connection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<ConnectionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<RoomName>,
    #[serde(default)]
    pub is_only_one: bool,
}

impl EventOptions {
    /// Every connection in the namespace.
    pub fn broadcast() -> Self {
        Self::default()
    }

    /// Every connection of a user.
    pub fn to_user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            ..Self::default()
        }
    }

    /// A single connection.
    pub fn to_client(client_id: ConnectionId) -> Self {
        Self {
            client_id: Some(client_id),
            ..Self::default()
        }
    }

    /// Every member of a room.
    pub fn to_room(room: RoomName) -> Self {
        Self {
            room: Some(room),
            ..Self::default()
        }
    }

    /// Restricts user addressing to one arbitrary device.
    pub fn only_one(mut self) -> Self {
        self.is_only_one = true;
        self
    }
}
