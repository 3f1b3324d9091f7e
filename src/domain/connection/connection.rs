//! Per-connection record tracked by the lifecycle controller.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ConnectionId, StateMachine, UserId, ValidationError};

use super::ConnectionState;

/// Authenticated sender of an inbound envelope.
///
/// Handlers receive this instead of trusting anything the client claimed
/// inside the payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocketUser {
    pub user_id: UserId,
    pub client_id: ConnectionId,
}

impl SocketUser {
    pub fn new(user_id: UserId, client_id: ConnectionId) -> Self {
        Self { user_id, client_id }
    }
}

/// One live transport-level link.
#[derive(Debug, Clone)]
pub struct Connection {
    id: ConnectionId,
    user_id: Option<UserId>,
    state: ConnectionState,
}

impl Connection {
    /// A freshly opened link, before any hook has run.
    pub fn new(id: ConnectionId) -> Self {
        Self {
            id,
            user_id: None,
            state: ConnectionState::Connecting,
        }
    }

    pub fn id(&self) -> &ConnectionId {
        &self.id
    }

    pub fn user_id(&self) -> Option<&UserId> {
        self.user_id.as_ref()
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Binds the resolved identity. Fails if an identity is already bound.
    pub fn bind_user(&mut self, user_id: UserId) -> Result<(), ValidationError> {
        if self.user_id.is_some() {
            return Err(ValidationError::invalid_format(
                "user_id",
                format!("connection {} already bound", self.id),
            ));
        }
        self.user_id = Some(user_id);
        Ok(())
    }

    /// Moves to `target` if the lifecycle allows it.
    pub fn transition_to(&mut self, target: ConnectionState) -> Result<(), ValidationError> {
        self.state = self.state.transition_to(target)?;
        Ok(())
    }

    /// The authenticated sender, available once the handshake has bound an identity.
    pub fn socket_user(&self) -> Option<SocketUser> {
        self.user_id
            .clone()
            .map(|user_id| SocketUser::new(user_id, self.id.clone()))
    }
}
