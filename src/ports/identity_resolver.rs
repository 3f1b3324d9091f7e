//! IdentityResolver port - Turning a handshake into a user identity.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::foundation::{ConnectionId, IdentityError, UserId};

/// What the substrate knows about a connection when it opens.
#[derive(Debug, Clone, Default)]
pub struct Handshake {
    pub connection_id: ConnectionId,
    /// Query string parameters of the upgrade request.
    pub query: HashMap<String, String>,
    /// Request headers, keys lowercased.
    pub headers: HashMap<String, String>,
}

impl Handshake {
    pub fn new(connection_id: ConnectionId) -> Self {
        Self {
            connection_id,
            query: HashMap::new(),
            headers: HashMap::new(),
        }
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into().to_ascii_lowercase(), value.into());
        self
    }

    /// Looks up a header case-insensitively.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .get(&key.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// Port for resolving the authenticated user of a new connection.
///
/// Called exactly once per connection. The returned identity is bound for
/// the connection's whole lifetime.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(&self, handshake: &Handshake) -> Result<UserId, IdentityError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn IdentityResolver) {}

    #[test]
    fn header_lookup_ignores_case() {
        let handshake = Handshake::new(ConnectionId::new()).with_header("Authorization", "Bearer t");
        assert_eq!(handshake.header("authorization"), Some("Bearer t"));
        assert_eq!(handshake.header("AUTHORIZATION"), Some("Bearer t"));
    }
}
