//! ConnectionRegistry port - Interface for connection and room tracking.
//!
//! The registry holds three indexes that must always agree:
//!
//! ```text
//! connections:  conn-a -> (user 42, {user42, lobby})
//!               conn-b -> (user 42, {user42})
//!               conn-c -> (user 7,  {user7, lobby})
//!
//! users:        42 -> {conn-a, conn-b}
//!               7  -> {conn-c}
//!
//! rooms:        user42 -> {conn-a, conn-b}
//!               user7  -> {conn-c}
//!               lobby  -> {conn-a, conn-c}
//! ```
//!
//! Every mutation updates all sides atomically. Users and rooms that lose
//! their last connection disappear from the index. User fan-out reads the
//! `users` index, never room membership, so joining someone else's user
//! room grants nothing.

use std::collections::HashSet;

use async_trait::async_trait;

use crate::domain::connection::RoomName;
use crate::domain::foundation::{ConnectionId, DomainError, ErrorCode, UserId};

/// Errors that can occur in connection registry operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectionRegistryError {
    /// Connection not registered
    #[error("Connection {0} not found")]
    NotFound(ConnectionId),

    /// Connection registered twice
    #[error("Connection {0} already registered")]
    AlreadyRegistered(ConnectionId),

    /// Backing store failure
    #[error("Registry backend error: {0}")]
    Backend(String),
}

impl From<ConnectionRegistryError> for DomainError {
    fn from(err: ConnectionRegistryError) -> Self {
        let code = match err {
            ConnectionRegistryError::NotFound(_) => ErrorCode::ConnectionNotFound,
            _ => ErrorCode::InternalError,
        };
        DomainError::new(code, err.to_string())
    }
}

/// Port for tracking live connections, their users and their rooms.
///
/// Lookups on unknown connections or rooms return empty results rather
/// than errors, so emitting to a vanished target is a no-op.
#[async_trait]
pub trait ConnectionRegistry: Send + Sync {
    /// Record a connection bound to `user_id`. Memberships start empty.
    async fn register(
        &self,
        connection_id: &ConnectionId,
        user_id: &UserId,
    ) -> Result<(), ConnectionRegistryError>;

    /// Remove a connection and purge every room membership it held.
    ///
    /// Returns the rooms it was removed from. Unknown connections yield an
    /// empty list.
    async fn unregister(&self, connection_id: &ConnectionId) -> Vec<RoomName>;

    /// Add a registered connection to a room. Idempotent.
    async fn join(
        &self,
        connection_id: &ConnectionId,
        room: &RoomName,
    ) -> Result<(), ConnectionRegistryError>;

    /// Remove a connection from a room. Returns whether it was a member.
    async fn leave(&self, connection_id: &ConnectionId, room: &RoomName) -> bool;

    /// The user bound to a connection.
    async fn user_of(&self, connection_id: &ConnectionId) -> Option<UserId>;

    /// Rooms a connection belongs to.
    async fn rooms_of(&self, connection_id: &ConnectionId) -> HashSet<RoomName>;

    /// Members of a room.
    async fn room_members(&self, room: &RoomName) -> HashSet<ConnectionId>;

    /// Every registered connection.
    async fn all_connections(&self) -> Vec<ConnectionId>;

    /// Whether a connection is registered.
    async fn contains(&self, connection_id: &ConnectionId) -> bool;

    /// Every connection bound to `user_id` at registration.
    async fn connections_of_user(&self, user_id: &UserId) -> HashSet<ConnectionId>;
}
