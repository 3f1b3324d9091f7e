//! Command request envelope and its addressing options.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::domain::connection::{RoomName, SocketUser};
use crate::domain::foundation::{ConnectionId, UserId};

use super::wire;

/// Addressing and reply options of a command request.
///
/// Outbound, at most one of `user_id`/`client_id`/`room` names the target.
/// Inbound, `user_id`/`client_id` are overwritten with the sender's bound
/// identity so they say who to reply to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<ConnectionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<RoomName>,
    #[serde(default)]
    pub is_only_one: bool,
    #[serde(default)]
    pub needs_reply: bool,
}

impl CommandOptions {
    pub fn to_user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            ..Self::default()
        }
    }

    pub fn to_client(client_id: ConnectionId) -> Self {
        Self {
            client_id: Some(client_id),
            ..Self::default()
        }
    }

    pub fn to_room(room: RoomName) -> Self {
        Self {
            room: Some(room),
            ..Self::default()
        }
    }

    pub fn only_one(mut self) -> Self {
        self.is_only_one = true;
        self
    }

    pub fn with_reply(mut self) -> Self {
        self.needs_reply = true;
        self
    }
}

/// One in-flight command invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestEnvelope {
    /// Caller-chosen correlation id.
    pub id: String,
    /// Command name.
    pub name: String,
    /// Command arguments, opaque to routing.
    #[serde(default)]
    pub request: Value,
    #[serde(default)]
    pub options: CommandOptions,
}

impl RequestEnvelope {
    /// Creates an outbound request with a fresh correlation id.
    pub fn new(name: impl Into<String>, request: Value, options: CommandOptions) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            request,
            options,
        }
    }

    /// Replaces the generated correlation id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Parses an inbound payload, defaulting absent options.
    ///
    /// `None` for null payloads or a missing `id`. Claimed `userId`/`clientId`
    /// are not read; option fields of the wrong type are ignored.
    pub fn from_wire(value: Value) -> Option<Self> {
        let mut fields = wire::fields(value)?;
        let id = wire::correlation_id(&fields, "id")?;
        let options = match fields.get("options") {
            Some(Value::Object(options)) => CommandOptions {
                room: options
                    .get("room")
                    .and_then(wire::text)
                    .and_then(|name| RoomName::new(name).ok()),
                is_only_one: wire::flag(options, "isOnlyOne"),
                needs_reply: wire::flag(options, "needsReply"),
                ..CommandOptions::default()
            },
            _ => CommandOptions::default(),
        };
        Some(Self {
            id,
            name: wire::name(&fields),
            request: wire::take(&mut fields, "request"),
            options,
        })
    }

    /// Overwrites `options.userId`/`options.clientId` with the sender.
    pub fn stamp(&mut self, sender: &SocketUser) {
        self.options.user_id = Some(sender.user_id.clone());
        self.options.client_id = Some(sender.client_id.clone());
    }

    /// Stamped sender, if any.
    pub fn sender(&self) -> Option<SocketUser> {
        Some(SocketUser::new(
            self.options.user_id.clone()?,
            self.options.client_id.clone()?,
        ))
    }

    pub fn needs_reply(&self) -> bool {
        self.options.needs_reply
    }
}
