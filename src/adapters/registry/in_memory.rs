//! In-memory connection registry.
//!
//! All indexes live behind one `RwLock` so every join/leave/register/
//! unregister is atomic with respect to lookups. Lookups take a read lock
//! and clone out, so no lock is ever held across a send.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::connection::RoomName;
use crate::domain::foundation::{ConnectionId, UserId};
use crate::ports::{ConnectionRegistry, ConnectionRegistryError};

#[derive(Debug)]
struct ConnectionEntry {
    user_id: UserId,
    rooms: HashSet<RoomName>,
}

#[derive(Debug, Default)]
struct Indexes {
    connections: HashMap<ConnectionId, ConnectionEntry>,
    users: HashMap<UserId, HashSet<ConnectionId>>,
    rooms: HashMap<RoomName, HashSet<ConnectionId>>,
}

/// Single-process registry of connections and room memberships.
#[derive(Debug, Default)]
pub struct InMemoryConnectionRegistry {
    inner: RwLock<Indexes>,
}

impl InMemoryConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of rooms that currently have members (for monitoring/debugging).
    pub async fn active_rooms(&self) -> Vec<RoomName> {
        self.inner.read().await.rooms.keys().cloned().collect()
    }

    /// Total number of registered connections.
    pub async fn connection_count(&self) -> usize {
        self.inner.read().await.connections.len()
    }
}

#[async_trait]
impl ConnectionRegistry for InMemoryConnectionRegistry {
    async fn register(
        &self,
        connection_id: &ConnectionId,
        user_id: &UserId,
    ) -> Result<(), ConnectionRegistryError> {
        let mut inner = self.inner.write().await;
        if inner.connections.contains_key(connection_id) {
            return Err(ConnectionRegistryError::AlreadyRegistered(
                connection_id.clone(),
            ));
        }
        inner.connections.insert(
            connection_id.clone(),
            ConnectionEntry {
                user_id: user_id.clone(),
                rooms: HashSet::new(),
            },
        );
        inner
            .users
            .entry(user_id.clone())
            .or_default()
            .insert(connection_id.clone());
        Ok(())
    }

    async fn unregister(&self, connection_id: &ConnectionId) -> Vec<RoomName> {
        let mut inner = self.inner.write().await;
        let Some(entry) = inner.connections.remove(connection_id) else {
            return Vec::new();
        };
        if let Some(devices) = inner.users.get_mut(&entry.user_id) {
            devices.remove(connection_id);
            if devices.is_empty() {
                inner.users.remove(&entry.user_id);
            }
        }
        for room in &entry.rooms {
            if let Some(members) = inner.rooms.get_mut(room) {
                members.remove(connection_id);
                if members.is_empty() {
                    inner.rooms.remove(room);
                }
            }
        }
        entry.rooms.into_iter().collect()
    }

    async fn join(
        &self,
        connection_id: &ConnectionId,
        room: &RoomName,
    ) -> Result<(), ConnectionRegistryError> {
        let mut inner = self.inner.write().await;
        let entry = inner
            .connections
            .get_mut(connection_id)
            .ok_or_else(|| ConnectionRegistryError::NotFound(connection_id.clone()))?;
        entry.rooms.insert(room.clone());
        inner
            .rooms
            .entry(room.clone())
            .or_default()
            .insert(connection_id.clone());
        Ok(())
    }

    async fn leave(&self, connection_id: &ConnectionId, room: &RoomName) -> bool {
        let mut inner = self.inner.write().await;
        let was_member = inner
            .connections
            .get_mut(connection_id)
            .map(|entry| entry.rooms.remove(room))
            .unwrap_or(false);
        if let Some(members) = inner.rooms.get_mut(room) {
            members.remove(connection_id);
            if members.is_empty() {
                inner.rooms.remove(room);
            }
        }
        was_member
    }

    async fn user_of(&self, connection_id: &ConnectionId) -> Option<UserId> {
        self.inner
            .read()
            .await
            .connections
            .get(connection_id)
            .map(|entry| entry.user_id.clone())
    }

    async fn rooms_of(&self, connection_id: &ConnectionId) -> HashSet<RoomName> {
        self.inner
            .read()
            .await
            .connections
            .get(connection_id)
            .map(|entry| entry.rooms.clone())
            .unwrap_or_default()
    }

    async fn room_members(&self, room: &RoomName) -> HashSet<ConnectionId> {
        self.inner
            .read()
            .await
            .rooms
            .get(room)
            .cloned()
            .unwrap_or_default()
    }

    async fn connections_of_user(&self, user_id: &UserId) -> HashSet<ConnectionId> {
        self.inner
            .read()
            .await
            .users
            .get(user_id)
            .cloned()
            .unwrap_or_default()
    }

    async fn all_connections(&self) -> Vec<ConnectionId> {
        self.inner.read().await.connections.keys().cloned().collect()
    }

    async fn contains(&self, connection_id: &ConnectionId) -> bool {
        self.inner
            .read()
            .await
            .connections
            .contains_key(connection_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn(id: &str) -> ConnectionId {
        ConnectionId::parse(id).unwrap()
    }

    fn user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    fn room(name: &str) -> RoomName {
        RoomName::new(name).unwrap()
    }

    #[tokio::test]
    async fn register_then_lookup_user() {
        let registry = InMemoryConnectionRegistry::new();
        registry.register(&conn("c1"), &user("42")).await.unwrap();

        assert_eq!(registry.user_of(&conn("c1")).await, Some(user("42")));
        assert!(registry.contains(&conn("c1")).await);
        assert_eq!(registry.connection_count().await, 1);
    }

    #[tokio::test]
    async fn register_twice_fails() {
        let registry = InMemoryConnectionRegistry::new();
        registry.register(&conn("c1"), &user("42")).await.unwrap();

        let err = registry.register(&conn("c1"), &user("42")).await.unwrap_err();
        assert_eq!(err, ConnectionRegistryError::AlreadyRegistered(conn("c1")));
    }

    #[tokio::test]
    async fn join_unknown_connection_fails() {
        let registry = InMemoryConnectionRegistry::new();
        let err = registry.join(&conn("c1"), &room("lobby")).await.unwrap_err();
        assert_eq!(err, ConnectionRegistryError::NotFound(conn("c1")));
        assert!(registry.active_rooms().await.is_empty());
    }

    #[tokio::test]
    async fn join_updates_both_indexes() {
        let registry = InMemoryConnectionRegistry::new();
        registry.register(&conn("c1"), &user("42")).await.unwrap();
        registry.join(&conn("c1"), &room("lobby")).await.unwrap();

        assert!(registry.rooms_of(&conn("c1")).await.contains(&room("lobby")));
        assert!(registry.room_members(&room("lobby")).await.contains(&conn("c1")));
    }

    #[tokio::test]
    async fn join_is_idempotent() {
        let registry = InMemoryConnectionRegistry::new();
        registry.register(&conn("c1"), &user("42")).await.unwrap();
        registry.join(&conn("c1"), &room("lobby")).await.unwrap();
        registry.join(&conn("c1"), &room("lobby")).await.unwrap();

        assert_eq!(registry.room_members(&room("lobby")).await.len(), 1);
    }

    #[tokio::test]
    async fn leaving_last_member_drops_room() {
        let registry = InMemoryConnectionRegistry::new();
        registry.register(&conn("c1"), &user("42")).await.unwrap();
        registry.join(&conn("c1"), &room("lobby")).await.unwrap();

        assert!(registry.leave(&conn("c1"), &room("lobby")).await);
        assert!(registry.active_rooms().await.is_empty());
        assert!(!registry.leave(&conn("c1"), &room("lobby")).await);
    }

    #[tokio::test]
    async fn unregister_purges_every_membership() {
        let registry = InMemoryConnectionRegistry::new();
        registry.register(&conn("c1"), &user("42")).await.unwrap();
        registry.register(&conn("c2"), &user("7")).await.unwrap();
        registry.join(&conn("c1"), &room("lobby")).await.unwrap();
        registry.join(&conn("c1"), &room("user42")).await.unwrap();
        registry.join(&conn("c2"), &room("lobby")).await.unwrap();

        let mut left = registry.unregister(&conn("c1")).await;
        left.sort();
        assert_eq!(left, vec![room("lobby"), room("user42")]);

        assert!(!registry.contains(&conn("c1")).await);
        assert_eq!(
            registry.room_members(&room("lobby")).await,
            HashSet::from([conn("c2")])
        );
        assert!(registry.room_members(&room("user42")).await.is_empty());
    }

    #[tokio::test]
    async fn unregister_unknown_is_noop() {
        let registry = InMemoryConnectionRegistry::new();
        assert!(registry.unregister(&conn("ghost")).await.is_empty());
    }

    #[tokio::test]
    async fn connections_of_user_follows_registration() {
        let registry = InMemoryConnectionRegistry::new();
        registry.register(&conn("a"), &user("42")).await.unwrap();
        registry.register(&conn("b"), &user("42")).await.unwrap();
        registry.register(&conn("c"), &user("7")).await.unwrap();

        assert_eq!(
            registry.connections_of_user(&user("42")).await,
            HashSet::from([conn("a"), conn("b")])
        );

        registry.unregister(&conn("a")).await;
        registry.unregister(&conn("c")).await;
        assert_eq!(
            registry.connections_of_user(&user("42")).await,
            HashSet::from([conn("b")])
        );
        assert!(registry.connections_of_user(&user("7")).await.is_empty());
    }

    #[tokio::test]
    async fn joining_another_users_room_does_not_bind_to_that_user() {
        let registry = InMemoryConnectionRegistry::new();
        registry.register(&conn("a"), &user("alice")).await.unwrap();
        registry.register(&conn("b"), &user("bob")).await.unwrap();
        registry
            .join(&conn("b"), &RoomName::user_room(&user("alice")))
            .await
            .unwrap();

        assert_eq!(
            registry.connections_of_user(&user("alice")).await,
            HashSet::from([conn("a")])
        );
    }
}
