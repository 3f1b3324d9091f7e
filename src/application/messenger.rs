//! Outbound envelope construction.
//!
//! Addressing is validated before anything is sent. Delivery failures go to
//! the [`DeliveryErrorHandler`] and never reach the caller.

use std::sync::Arc;

use crate::domain::envelope::{
    AddressingError, EventEnvelope, EventOptions, RequestEnvelope, ResponseEnvelope, Target,
    TRANSPORT_SOCKET_COMMAND_REQUEST_METHOD, TRANSPORT_SOCKET_COMMAND_RESPONSE_METHOD,
    TRANSPORT_SOCKET_EVENT,
};
use crate::ports::DeliveryErrorHandler;

use super::OutboundGateway;

/// Sends events, requests and responses to connected clients.
#[derive(Clone)]
pub struct SocketMessenger {
    gateway: OutboundGateway,
    errors: Arc<dyn DeliveryErrorHandler>,
}

impl SocketMessenger {
    pub fn new(gateway: OutboundGateway, errors: Arc<dyn DeliveryErrorHandler>) -> Self {
        Self { gateway, errors }
    }

    /// Sends an event. No addressing option means every connection.
    ///
    /// # Errors
    ///
    /// `AddressingError::AmbiguousTarget` if more than one option is set.
    pub async fn send_event(
        &self,
        event: &EventEnvelope,
        options: &EventOptions,
    ) -> Result<(), AddressingError> {
        let target = Target::for_event(options)?;
        if let Err(e) = self
            .gateway
            .emit_to(&target, TRANSPORT_SOCKET_EVENT, event)
            .await
        {
            self.errors.on_event_error(event, &e).await;
        }
        Ok(())
    }

    /// Sends a command request to exactly one of user, client or room.
    pub async fn send_request(&self, request: &RequestEnvelope) -> Result<(), AddressingError> {
        let target = Target::for_request(&request.options)?;
        if let Err(e) = self
            .gateway
            .emit_to(&target, TRANSPORT_SOCKET_COMMAND_REQUEST_METHOD, request)
            .await
        {
            self.errors.on_request_error(request, &e).await;
        }
        Ok(())
    }

    /// Sends a command response to the connection named by its `client_id`.
    pub async fn send_response(&self, response: &ResponseEnvelope) -> Result<(), AddressingError> {
        let target = Target::for_response(response)?;
        if let Err(e) = self
            .gateway
            .emit_to(&target, TRANSPORT_SOCKET_COMMAND_RESPONSE_METHOD, response)
            .await
        {
            self.errors.on_response_error(response, &e).await;
        }
        Ok(())
    }

    pub fn gateway(&self) -> &OutboundGateway {
        &self.gateway
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::registry::InMemoryConnectionRegistry;
    use crate::adapters::transport::InMemoryTransport;
    use crate::application::AddressingResolver;
    use crate::domain::connection::RoomName;
    use crate::domain::envelope::CommandOptions;
    use crate::domain::foundation::{ConnectionId, UserId};
    use crate::ports::{ConnectionRegistry, DeliveryError};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingErrors {
        events: AtomicUsize,
    }

    #[async_trait]
    impl DeliveryErrorHandler for CountingErrors {
        async fn on_event_error(&self, _: &EventEnvelope, _: &DeliveryError) {
            self.events.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct Fixture {
        registry: Arc<InMemoryConnectionRegistry>,
        transport: Arc<InMemoryTransport>,
        errors: Arc<CountingErrors>,
        messenger: SocketMessenger,
    }

    fn fixture() -> Fixture {
        let registry = Arc::new(InMemoryConnectionRegistry::new());
        let transport = Arc::new(InMemoryTransport::new());
        let errors = Arc::new(CountingErrors::default());
        let gateway = OutboundGateway::new(
            AddressingResolver::new(registry.clone()),
            transport.clone(),
        );
        Fixture {
            registry,
            transport,
            errors: errors.clone(),
            messenger: SocketMessenger::new(gateway, errors),
        }
    }

    fn conn(id: &str) -> ConnectionId {
        ConnectionId::parse(id).unwrap()
    }

    #[tokio::test]
    async fn request_without_target_fails_before_send() {
        let f = fixture();
        let request = RequestEnvelope::new("ping", Value::Null, CommandOptions::default());

        assert_eq!(
            f.messenger.send_request(&request).await,
            Err(AddressingError::NoTarget)
        );
        assert!(f.transport.recipients().is_empty());
    }

    #[tokio::test]
    async fn request_with_two_targets_fails_before_send() {
        let f = fixture();
        let options = CommandOptions {
            user_id: Some(UserId::new("42").unwrap()),
            room: Some(RoomName::new("lobby").unwrap()),
            ..CommandOptions::default()
        };
        let request = RequestEnvelope::new("ping", Value::Null, options);

        assert_eq!(
            f.messenger.send_request(&request).await,
            Err(AddressingError::AmbiguousTarget(2))
        );
    }

    #[tokio::test]
    async fn response_without_client_fails() {
        let f = fixture();
        let request = RequestEnvelope::new("ping", Value::Null, CommandOptions::default());
        let response = ResponseEnvelope::success(&request, json!(1));

        assert_eq!(
            f.messenger.send_response(&response).await,
            Err(AddressingError::MissingClientId)
        );
    }

    #[tokio::test]
    async fn event_without_options_is_broadcast() {
        let f = fixture();
        let user = UserId::new("42").unwrap();
        for id in ["a", "b"] {
            f.registry.register(&conn(id), &user).await.unwrap();
        }

        f.messenger
            .send_event(&EventEnvelope::new("typing", json!(1)), &EventOptions::broadcast())
            .await
            .unwrap();

        assert_eq!(f.transport.recipients().len(), 2);
        let frame = &f.transport.frames_for(&conn("a"))[0];
        assert_eq!(frame.event, TRANSPORT_SOCKET_EVENT);
        assert_eq!(frame.data["name"], "typing");
    }

    #[tokio::test]
    async fn delivery_failures_go_to_the_handler() {
        let f = fixture();
        f.registry
            .register(&conn("a"), &UserId::new("42").unwrap())
            .await
            .unwrap();
        f.transport.fail_for(&conn("a"));

        let result = f
            .messenger
            .send_event(&EventEnvelope::new("typing", json!(1)), &EventOptions::broadcast())
            .await;

        assert!(result.is_ok());
        assert_eq!(f.errors.events.load(Ordering::SeqCst), 1);
    }
}
