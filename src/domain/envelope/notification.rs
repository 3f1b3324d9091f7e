//! Server-originated notifications sent outside the envelope protocol.

use serde::{Deserialize, Serialize};

use crate::domain::connection::SocketUser;
use crate::domain::foundation::{ConnectionId, Timestamp, UserId};

/// Connected acknowledgement, sent once the identity is bound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedMessage {
    pub client_id: ConnectionId,
    pub user_id: UserId,
}

impl From<&SocketUser> for ConnectedMessage {
    fn from(user: &SocketUser) -> Self {
        Self {
            client_id: user.client_id.clone(),
            user_id: user.user_id.clone(),
        }
    }
}

/// Error notification sent right before a rejected link is closed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub code: String,
    pub message: String,
    pub timestamp: String,
}

impl ErrorMessage {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            timestamp: Timestamp::now().to_rfc3339(),
        }
    }
}
