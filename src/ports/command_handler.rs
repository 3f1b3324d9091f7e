//! Command and event handler ports.
//!
//! Handlers are bound to the authenticated sender of each envelope. They
//! never see the raw options a client sent.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::domain::connection::SocketUser;
use crate::domain::foundation::DomainError;

/// Handles one named command received as a request envelope.
///
/// # Example
///
/// ```ignore
/// struct Ping;
///
/// #[async_trait]
/// impl SocketCommandHandler for Ping {
///     type Request = serde_json::Value;
///     type Response = String;
///
///     fn name(&self) -> &str { "ping" }
///
///     async fn execute(&self, _: Self::Request, _: &SocketUser) -> Result<String, DomainError> {
///         Ok("pong".into())
///     }
/// }
/// ```
#[async_trait]
pub trait SocketCommandHandler: Send + Sync + 'static {
    type Request: DeserializeOwned + Send;
    type Response: Serialize + Send;

    /// Command name matched against the request envelope's `name`.
    fn name(&self) -> &str;

    async fn execute(
        &self,
        request: Self::Request,
        user: &SocketUser,
    ) -> Result<Self::Response, DomainError>;
}

/// Handles one named event.
#[async_trait]
pub trait SocketEventHandler: Send + Sync + 'static {
    type Data: DeserializeOwned + Send;

    fn name(&self) -> &str;

    async fn handle(&self, data: Self::Data, user: &SocketUser) -> Result<(), DomainError>;
}
