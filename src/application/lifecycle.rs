//! Connection lifecycle controller.
//!
//! ```text
//!              on_connect ok          identity bound
//! Connecting ──────────────> Handshaking ──────────────> Active
//!     │                          │    │                     │
//!     │ hook failed / dropped    │    │ link dropped        │ disconnect
//!     ▼                          ▼    ▼                     ▼
//!   Closed <──────────────── Closed  Disconnecting <────────┘
//!                                          │
//!                                          ▼
//!                                        Closed
//! ```
//!
//! Only Active connections accept traffic. A rejected handshake sends one
//! error notification, closes the link and leaves nothing registered.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::RwLock;

use crate::domain::connection::{Connection, ConnectionState, RoomName, SocketUser};
use crate::domain::envelope::{
    ConnectedMessage, EnvelopeKind, ErrorMessage, TRANSPORT_SOCKET_CONNECTED,
    TRANSPORT_SOCKET_EXCEPTION,
};
use crate::domain::foundation::{
    ConnectionId, DomainError, ErrorCode, IdentityError, ValidationError,
};
use crate::ports::{
    ConnectionRegistry, ConnectionRegistryError, Handshake, IdentityResolver, LifecycleHooks,
    SocketFrame, SocketTransport,
};

use super::InboundDispatcher;

/// Why a connection never became Active.
#[derive(Debug, Error)]
pub enum HandshakeError {
    #[error("Connection rejected: {0}")]
    Rejected(DomainError),

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    Registry(#[from] ConnectionRegistryError),

    #[error("Invalid lifecycle transition: {0}")]
    Lifecycle(#[from] ValidationError),

    #[error("Connection closed during handshake")]
    Aborted,
}

impl HandshakeError {
    /// Code reported in the error notification.
    pub fn code(&self) -> ErrorCode {
        match self {
            HandshakeError::Rejected(e) => e.code(),
            HandshakeError::Identity(e) => e.code(),
            HandshakeError::Registry(_)
            | HandshakeError::Lifecycle(_)
            | HandshakeError::Aborted => ErrorCode::InternalError,
        }
    }
}

/// Drives connections through their lifecycle and gates inbound traffic.
pub struct LifecycleController {
    connections: RwLock<HashMap<ConnectionId, Connection>>,
    registry: Arc<dyn ConnectionRegistry>,
    resolver: Arc<dyn IdentityResolver>,
    hooks: Arc<dyn LifecycleHooks>,
    transport: Arc<dyn SocketTransport>,
    dispatcher: InboundDispatcher,
}

impl LifecycleController {
    pub fn new(
        registry: Arc<dyn ConnectionRegistry>,
        resolver: Arc<dyn IdentityResolver>,
        hooks: Arc<dyn LifecycleHooks>,
        transport: Arc<dyn SocketTransport>,
        dispatcher: InboundDispatcher,
    ) -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            registry,
            resolver,
            hooks,
            transport,
            dispatcher,
        }
    }

    /// Runs the handshake for a freshly opened link.
    ///
    /// On success the connection is Active, registered, in its reserved user
    /// room, and has been sent the connected acknowledgement. On failure it
    /// has been sent the error notification and closed.
    pub async fn handle_connection(
        &self,
        handshake: Handshake,
    ) -> Result<SocketUser, HandshakeError> {
        let connection_id = handshake.connection_id.clone();
        {
            let mut connections = self.connections.write().await;
            if connections.contains_key(&connection_id) {
                return Err(ConnectionRegistryError::AlreadyRegistered(connection_id).into());
            }
            connections.insert(connection_id.clone(), Connection::new(connection_id.clone()));
        }

        match self.establish(&handshake).await {
            Ok(user) => {
                tracing::info!(
                    connection_id = %user.client_id,
                    user_id = %user.user_id,
                    "Connection established"
                );
                self.send_frame(
                    &connection_id,
                    TRANSPORT_SOCKET_CONNECTED,
                    &ConnectedMessage::from(&user),
                )
                .await;
                Ok(user)
            }
            Err(err) => {
                self.reject(&connection_id, &err).await;
                Err(err)
            }
        }
    }

    /// Routes one inbound frame. Returns whether an envelope was published.
    ///
    /// Frames for unknown methods or for connections that are not Active
    /// are dropped.
    pub async fn handle_frame(&self, connection_id: &ConnectionId, frame: SocketFrame) -> bool {
        let Some(kind) = EnvelopeKind::from_method(&frame.event) else {
            tracing::debug!(
                connection_id = %connection_id,
                event = %frame.event,
                "No listener for method"
            );
            return false;
        };

        let sender = {
            let connections = self.connections.read().await;
            connections
                .get(connection_id)
                .filter(|c| c.state().accepts_traffic())
                .and_then(Connection::socket_user)
        };
        let Some(sender) = sender else {
            tracing::debug!(connection_id = %connection_id, "Dropping frame for inactive connection");
            return false;
        };

        self.dispatcher.dispatch(&sender, kind, frame.data).await
    }

    /// Tears a connection down. Idempotent.
    ///
    /// The `on_disconnect` hook runs first; if it fails the link is forced
    /// closed. Registry purge always runs.
    pub async fn handle_disconnect(&self, connection_id: &ConnectionId) {
        let user = {
            let mut connections = self.connections.write().await;
            let Some(connection) = connections.get_mut(connection_id) else {
                return;
            };
            match connection.state() {
                ConnectionState::Connecting => {
                    connections.remove(connection_id);
                    tracing::debug!(connection_id = %connection_id, "Link dropped before handshake");
                    return;
                }
                ConnectionState::Handshaking | ConnectionState::Active => {
                    if let Err(e) = connection.transition_to(ConnectionState::Disconnecting) {
                        tracing::warn!(connection_id = %connection_id, "Disconnect transition refused: {}", e);
                        return;
                    }
                    connection.socket_user()
                }
                ConnectionState::Disconnecting | ConnectionState::Closed => return,
            }
        };

        if let Err(e) = self.hooks.on_disconnect(connection_id, user.as_ref()).await {
            tracing::warn!(connection_id = %connection_id, "on_disconnect hook failed: {}", e);
            self.transport.close(connection_id).await;
        }

        let rooms = self.registry.unregister(connection_id).await;
        if let Some(mut connection) = self.connections.write().await.remove(connection_id) {
            let _ = connection.transition_to(ConnectionState::Closed);
        }
        tracing::info!(
            connection_id = %connection_id,
            rooms = rooms.len(),
            "Connection closed"
        );
    }

    /// Current lifecycle state, if the connection is known.
    pub async fn state_of(&self, connection_id: &ConnectionId) -> Option<ConnectionState> {
        self.connections
            .read()
            .await
            .get(connection_id)
            .map(Connection::state)
    }

    async fn establish(&self, handshake: &Handshake) -> Result<SocketUser, HandshakeError> {
        let connection_id = &handshake.connection_id;

        self.hooks
            .on_connect(connection_id)
            .await
            .map_err(HandshakeError::Rejected)?;
        self.transition(connection_id, ConnectionState::Handshaking)
            .await?;

        let user_id = self.resolver.resolve(handshake).await?;

        self.registry.register(connection_id, &user_id).await?;
        self.registry
            .join(connection_id, &RoomName::user_room(&user_id))
            .await?;

        let mut connections = self.connections.write().await;
        let connection = connections
            .get_mut(connection_id)
            .filter(|c| c.state() == ConnectionState::Handshaking)
            .ok_or(HandshakeError::Aborted)?;
        connection.bind_user(user_id)?;
        connection.transition_to(ConnectionState::Active)?;
        connection.socket_user().ok_or(HandshakeError::Aborted)
    }

    async fn transition(
        &self,
        connection_id: &ConnectionId,
        target: ConnectionState,
    ) -> Result<(), HandshakeError> {
        let mut connections = self.connections.write().await;
        let connection = connections
            .get_mut(connection_id)
            .ok_or(HandshakeError::Aborted)?;
        connection.transition_to(target)?;
        Ok(())
    }

    async fn reject(&self, connection_id: &ConnectionId, err: &HandshakeError) {
        if matches!(err, HandshakeError::Aborted) {
            tracing::debug!(connection_id = %connection_id, "Handshake abandoned by disconnect");
        } else {
            tracing::warn!(connection_id = %connection_id, "Handshake rejected: {}", err);
            let notification = ErrorMessage::new(err.code().as_str(), err.to_string());
            self.send_frame(connection_id, TRANSPORT_SOCKET_EXCEPTION, &notification)
                .await;
        }

        self.registry.unregister(connection_id).await;
        if let Some(mut connection) = self.connections.write().await.remove(connection_id) {
            let _ = connection.transition_to(ConnectionState::Closed);
        }
        self.transport.close(connection_id).await;
    }

    async fn send_frame<T: serde::Serialize>(
        &self,
        connection_id: &ConnectionId,
        event: &str,
        payload: &T,
    ) {
        let data = match serde_json::to_value(payload) {
            Ok(data) => data,
            Err(e) => {
                tracing::error!(connection_id = %connection_id, event, "Failed to serialize notification: {}", e);
                return;
            }
        };
        let frame = Arc::new(SocketFrame::new(event, data));
        if let Err(e) = self.transport.send(connection_id, frame).await {
            tracing::warn!(connection_id = %connection_id, event, "Notification not delivered: {}", e);
        }
    }
}
