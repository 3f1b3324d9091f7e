//! Socket server facade.
//!
//! Wires the lifecycle controller, inbound bus, addressing resolver and
//! outbound gateway into one object, and exposes the imperative API used
//! by substrate adapters and application code.
//!
//! # Example
//!
//! ```ignore
//! let server = SocketServer::builder(transport, resolver)
//!     .bus_capacity(1024)
//!     .build();
//!
//! server.emit_to_user(&user_id, false, "notification", &payload).await?;
//! ```

use std::sync::Arc;

use futures::stream::BoxStream;
use serde::Serialize;
use tokio::sync::broadcast;

use crate::adapters::events::BroadcastInboundBus;
use crate::adapters::registry::InMemoryConnectionRegistry;
use crate::domain::connection::{RoomName, SocketUser};
use crate::domain::envelope::{EventEnvelope, InboundMessage, RequestEnvelope, ResponseEnvelope};
use crate::domain::foundation::{ConnectionId, DomainError, UserId};
use crate::ports::{
    ConnectionRegistry, DeliveryError, DeliveryErrorHandler, Handshake, IdentityResolver,
    LifecycleHooks, LoggingDeliveryErrorHandler, NoopHooks, SocketFrame, SocketTransport,
};

use super::handlers::{ensure_not_reserved, RoomHandler};
use super::{
    AddressingResolver, CommandRouter, DeliveryReport, HandshakeError, InboundDispatcher,
    LifecycleController, OutboundGateway, SocketMessenger,
};

/// Builder for [`SocketServer`].
///
/// Transport and identity resolver are required; everything else has an
/// in-process default.
pub struct SocketServerBuilder {
    transport: Arc<dyn SocketTransport>,
    resolver: Arc<dyn IdentityResolver>,
    registry: Option<Arc<dyn ConnectionRegistry>>,
    hooks: Arc<dyn LifecycleHooks>,
    delivery_errors: Arc<dyn DeliveryErrorHandler>,
    bus_capacity: usize,
}

impl SocketServerBuilder {
    pub fn registry(mut self, registry: Arc<dyn ConnectionRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn hooks(mut self, hooks: Arc<dyn LifecycleHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn delivery_errors(mut self, handler: Arc<dyn DeliveryErrorHandler>) -> Self {
        self.delivery_errors = handler;
        self
    }

    pub fn bus_capacity(mut self, capacity: usize) -> Self {
        self.bus_capacity = capacity;
        self
    }

    pub fn build(self) -> SocketServer {
        let registry: Arc<dyn ConnectionRegistry> = match self.registry {
            Some(registry) => registry,
            None => Arc::new(InMemoryConnectionRegistry::new()),
        };
        let bus = Arc::new(BroadcastInboundBus::new(self.bus_capacity));
        let gateway = OutboundGateway::new(
            AddressingResolver::new(registry.clone()),
            self.transport.clone(),
        );
        let messenger = SocketMessenger::new(gateway.clone(), self.delivery_errors);
        let lifecycle = LifecycleController::new(
            registry.clone(),
            self.resolver,
            self.hooks,
            self.transport.clone(),
            InboundDispatcher::new(bus.clone()),
        );

        SocketServer {
            registry,
            transport: self.transport,
            bus,
            gateway,
            messenger,
            lifecycle,
        }
    }
}

/// Entry point of the routing layer.
pub struct SocketServer {
    registry: Arc<dyn ConnectionRegistry>,
    transport: Arc<dyn SocketTransport>,
    bus: Arc<BroadcastInboundBus>,
    gateway: OutboundGateway,
    messenger: SocketMessenger,
    lifecycle: LifecycleController,
}

impl SocketServer {
    pub fn builder(
        transport: Arc<dyn SocketTransport>,
        resolver: Arc<dyn IdentityResolver>,
    ) -> SocketServerBuilder {
        SocketServerBuilder {
            transport,
            resolver,
            registry: None,
            hooks: Arc::new(NoopHooks),
            delivery_errors: Arc::new(LoggingDeliveryErrorHandler),
            bus_capacity: 1024,
        }
    }

    // ============================================
    // Substrate entry points
    // ============================================

    pub async fn handle_connection(
        &self,
        handshake: Handshake,
    ) -> Result<SocketUser, HandshakeError> {
        self.lifecycle.handle_connection(handshake).await
    }

    pub async fn handle_frame(&self, connection_id: &ConnectionId, frame: SocketFrame) -> bool {
        self.lifecycle.handle_frame(connection_id, frame).await
    }

    pub async fn handle_disconnect(&self, connection_id: &ConnectionId) {
        self.lifecycle.handle_disconnect(connection_id).await
    }

    // ============================================
    // Inbound streams
    // ============================================

    pub fn subscribe(&self) -> broadcast::Receiver<InboundMessage> {
        self.bus.subscribe()
    }

    pub fn stream(&self) -> BoxStream<'static, InboundMessage> {
        self.bus.stream()
    }

    pub fn events(&self) -> BoxStream<'static, EventEnvelope> {
        self.bus.events()
    }

    pub fn requests(&self) -> BoxStream<'static, RequestEnvelope> {
        self.bus.requests()
    }

    pub fn responses(&self) -> BoxStream<'static, ResponseEnvelope> {
        self.bus.responses()
    }

    // ============================================
    // Outbound
    // ============================================

    /// Broadcast to every connection.
    pub async fn emit<T>(&self, event: &str, payload: &T) -> Result<DeliveryReport, DeliveryError>
    where
        T: Serialize + ?Sized,
    {
        self.gateway.emit(event, payload).await
    }

    pub async fn emit_to_client<T>(
        &self,
        connection_id: &ConnectionId,
        event: &str,
        payload: &T,
    ) -> Result<DeliveryReport, DeliveryError>
    where
        T: Serialize + ?Sized,
    {
        self.gateway
            .emit_to_client(connection_id, event, payload)
            .await
    }

    /// Every connection of `user_id`, or one of them when `only_one`.
    pub async fn emit_to_user<T>(
        &self,
        user_id: &UserId,
        only_one: bool,
        event: &str,
        payload: &T,
    ) -> Result<DeliveryReport, DeliveryError>
    where
        T: Serialize + ?Sized,
    {
        self.gateway
            .emit_to_user(user_id, only_one, event, payload)
            .await
    }

    pub async fn emit_to_room<T>(
        &self,
        room: &RoomName,
        event: &str,
        payload: &T,
    ) -> Result<DeliveryReport, DeliveryError>
    where
        T: Serialize + ?Sized,
    {
        self.gateway.emit_to_room(room, event, payload).await
    }

    // ============================================
    // Room administration
    // ============================================

    /// Adds one connection to a room. Reserved rooms are refused.
    pub async fn add_client_to_room(
        &self,
        connection_id: &ConnectionId,
        room: &RoomName,
    ) -> Result<(), DomainError> {
        ensure_not_reserved(room.as_str())?;
        self.registry.join(connection_id, room).await?;
        Ok(())
    }

    /// Removes one connection from a room. Returns whether it was a member.
    pub async fn remove_client_from_room(
        &self,
        connection_id: &ConnectionId,
        room: &RoomName,
    ) -> Result<bool, DomainError> {
        ensure_not_reserved(room.as_str())?;
        Ok(self.registry.leave(connection_id, room).await)
    }

    /// Adds every connection of a user to a room. Returns how many joined.
    pub async fn add_user_to_room(
        &self,
        user_id: &UserId,
        room: &RoomName,
    ) -> Result<usize, DomainError> {
        ensure_not_reserved(room.as_str())?;
        let mut joined = 0;
        for connection_id in self.registry.connections_of_user(user_id).await {
            self.registry.join(&connection_id, room).await?;
            joined += 1;
        }
        Ok(joined)
    }

    /// Removes every connection of a user from a room. Returns how many left.
    pub async fn remove_user_from_room(
        &self,
        user_id: &UserId,
        room: &RoomName,
    ) -> Result<usize, DomainError> {
        ensure_not_reserved(room.as_str())?;
        let mut left = 0;
        for connection_id in self.registry.connections_of_user(user_id).await {
            if self.registry.leave(&connection_id, room).await {
                left += 1;
            }
        }
        Ok(left)
    }

    // ============================================
    // Administrative disconnect
    // ============================================

    /// Closes a connection and runs the normal disconnect path.
    pub async fn disconnect_client(&self, connection_id: &ConnectionId) {
        self.transport.close(connection_id).await;
        self.lifecycle.handle_disconnect(connection_id).await;
    }

    /// Disconnects every connection of a user. Returns how many were closed.
    pub async fn disconnect_user(&self, user_id: &UserId) -> usize {
        let connections = self.registry.connections_of_user(user_id).await;
        for connection_id in &connections {
            self.disconnect_client(connection_id).await;
        }
        connections.len()
    }

    // ============================================
    // Accessors
    // ============================================

    pub fn messenger(&self) -> SocketMessenger {
        self.messenger.clone()
    }

    pub fn registry(&self) -> Arc<dyn ConnectionRegistry> {
        self.registry.clone()
    }

    /// A command router sending replies through this server, with the room
    /// command already registered.
    pub fn command_router(&self) -> CommandRouter {
        let mut router = CommandRouter::new(self.messenger());
        router.register_command(RoomHandler::new(self.registry()));
        router
    }

    /// Starts `router` on this server's inbound stream.
    pub fn spawn_router(&self, router: CommandRouter) -> tokio::task::JoinHandle<()> {
        Arc::new(router).run(self.stream())
    }
}
