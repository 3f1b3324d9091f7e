//! LifecycleHooks port - Application callbacks around connect and disconnect.

use async_trait::async_trait;

use crate::domain::connection::SocketUser;
use crate::domain::foundation::{ConnectionId, DomainError};

/// Optional callbacks run by the lifecycle controller.
///
/// A failing `on_connect` rejects the connection. A failing `on_disconnect`
/// forces the link closed; cleanup still runs.
#[async_trait]
pub trait LifecycleHooks: Send + Sync {
    /// Runs before identity resolution.
    async fn on_connect(&self, _connection_id: &ConnectionId) -> Result<(), DomainError> {
        Ok(())
    }

    /// Runs before listeners are detached and memberships purged.
    ///
    /// `user` is `None` when the link dropped before the handshake bound an
    /// identity.
    async fn on_disconnect(
        &self,
        _connection_id: &ConnectionId,
        _user: Option<&SocketUser>,
    ) -> Result<(), DomainError> {
        Ok(())
    }
}

/// Hooks that do nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

impl LifecycleHooks for NoopHooks {}
