//! Command router: named handlers fed from the inbound bus.
//!
//! Each request runs on its own task. When the request asked for a reply,
//! the outcome goes back to the requesting connection as a response
//! envelope; otherwise it is only logged.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use serde_json::Value;
use tokio::task::JoinHandle;

use crate::domain::connection::SocketUser;
use crate::domain::envelope::{EventEnvelope, InboundMessage, RequestEnvelope, ResponseEnvelope};
use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::{SocketCommandHandler, SocketEventHandler};

use super::SocketMessenger;

// ============================================
// Type erasure over typed handlers
// ============================================

#[async_trait]
trait ErasedCommand: Send + Sync {
    async fn call(&self, args: Value, user: &SocketUser) -> Result<Value, DomainError>;
}

struct CommandAdapter<H>(H);

#[async_trait]
impl<H: SocketCommandHandler> ErasedCommand for CommandAdapter<H> {
    async fn call(&self, args: Value, user: &SocketUser) -> Result<Value, DomainError> {
        let request: H::Request = serde_json::from_value(args).map_err(|e| {
            DomainError::validation(
                "request",
                format!("Invalid \"{}\" arguments: {}", self.0.name(), e),
            )
        })?;
        let response = self.0.execute(request, user).await?;
        serde_json::to_value(response)
            .map_err(|e| DomainError::new(ErrorCode::InternalError, e.to_string()))
    }
}

#[async_trait]
trait ErasedEvent: Send + Sync {
    async fn call(&self, data: Value, user: &SocketUser) -> Result<(), DomainError>;
}

struct EventAdapter<H>(H);

#[async_trait]
impl<H: SocketEventHandler> ErasedEvent for EventAdapter<H> {
    async fn call(&self, data: Value, user: &SocketUser) -> Result<(), DomainError> {
        let data: H::Data = serde_json::from_value(data).map_err(|e| {
            DomainError::validation("data", format!("Invalid \"{}\" data: {}", self.0.name(), e))
        })?;
        self.0.handle(data, user).await
    }
}

// ============================================
// Router
// ============================================

/// Registry of command and event handlers keyed by name.
pub struct CommandRouter {
    commands: HashMap<String, Arc<dyn ErasedCommand>>,
    events: HashMap<String, Arc<dyn ErasedEvent>>,
    messenger: SocketMessenger,
}

impl CommandRouter {
    pub fn new(messenger: SocketMessenger) -> Self {
        Self {
            commands: HashMap::new(),
            events: HashMap::new(),
            messenger,
        }
    }

    /// Registers a command handler, replacing any handler with the same name.
    pub fn register_command<H: SocketCommandHandler>(&mut self, handler: H) -> &mut Self {
        let name = handler.name().to_string();
        tracing::debug!(command = %name, "Registering command handler");
        self.commands.insert(name, Arc::new(CommandAdapter(handler)));
        self
    }

    /// Registers an event handler, replacing any handler with the same name.
    pub fn register_event<H: SocketEventHandler>(&mut self, handler: H) -> &mut Self {
        let name = handler.name().to_string();
        tracing::debug!(event = %name, "Registering event handler");
        self.events.insert(name, Arc::new(EventAdapter(handler)));
        self
    }

    pub fn has_command(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// Executes one request and, if it needs a reply, sends the response.
    ///
    /// Returns the response that was sent, if any. Requests without a
    /// stamped sender are ignored.
    pub async fn handle_request(&self, request: RequestEnvelope) -> Option<ResponseEnvelope> {
        let Some(user) = request.sender() else {
            tracing::debug!(request_id = %request.id, "Ignoring unstamped request");
            return None;
        };

        let outcome = match self.commands.get(&request.name) {
            Some(handler) => handler.call(request.request.clone(), &user).await,
            None => Err(DomainError::new(
                ErrorCode::UnknownCommand,
                format!("Unknown command \"{}\"", request.name),
            )),
        };

        if let Err(e) = &outcome {
            tracing::debug!(
                command = %request.name,
                request_id = %request.id,
                connection_id = %user.client_id,
                "Command failed: {}",
                e
            );
        }

        if !request.needs_reply() {
            return None;
        }

        let response = match outcome {
            Ok(value) => ResponseEnvelope::success(&request, value),
            Err(e) => ResponseEnvelope::failure(&request, &e),
        };
        if let Err(e) = self.messenger.send_response(&response).await {
            tracing::warn!(request_id = %request.id, "Response not addressable: {}", e);
            return None;
        }
        Some(response)
    }

    /// Runs the event handler registered for `event.name`, if any.
    pub async fn handle_event(&self, event: EventEnvelope) {
        let (Some(handler), Some(user)) = (self.events.get(&event.name), event.sender()) else {
            return;
        };
        if let Err(e) = handler.call(event.data, &user).await {
            tracing::debug!(event = %event.name, uid = %event.uid, "Event handler failed: {}", e);
        }
    }

    /// Consumes inbound traffic until the stream ends, one task per message.
    pub fn run<S>(self: Arc<Self>, messages: S) -> JoinHandle<()>
    where
        S: Stream<Item = InboundMessage> + Send + Unpin + 'static,
    {
        tokio::spawn(async move {
            let mut messages = messages;
            while let Some(message) = messages.next().await {
                let router = Arc::clone(&self);
                match message {
                    InboundMessage::Request(request) => {
                        tokio::spawn(async move {
                            router.handle_request(request).await;
                        });
                    }
                    InboundMessage::Event(event) => {
                        tokio::spawn(async move {
                            router.handle_event(event).await;
                        });
                    }
                    InboundMessage::Response(_) => {}
                }
            }
            tracing::debug!("Inbound stream closed, command router stopped");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::registry::InMemoryConnectionRegistry;
    use crate::adapters::transport::InMemoryTransport;
    use crate::application::{AddressingResolver, OutboundGateway};
    use crate::domain::envelope::{CommandOptions, ResponseOutcome};
    use crate::domain::foundation::{ConnectionId, UserId};
    use crate::ports::{ConnectionRegistry, LoggingDeliveryErrorHandler};
    use serde::Deserialize;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Deserialize)]
    struct AddArgs {
        a: i64,
        b: i64,
    }

    struct Add;

    #[async_trait]
    impl SocketCommandHandler for Add {
        type Request = AddArgs;
        type Response = i64;

        fn name(&self) -> &str {
            "add"
        }

        async fn execute(&self, request: AddArgs, _: &SocketUser) -> Result<i64, DomainError> {
            Ok(request.a + request.b)
        }
    }

    struct Typing(Arc<AtomicUsize>);

    #[async_trait]
    impl SocketEventHandler for Typing {
        type Data = Value;

        fn name(&self) -> &str {
            "typing"
        }

        async fn handle(&self, _: Value, _: &SocketUser) -> Result<(), DomainError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    async fn router() -> (CommandRouter, Arc<InMemoryTransport>) {
        let registry = Arc::new(InMemoryConnectionRegistry::new());
        registry
            .register(&sender().client_id, &sender().user_id)
            .await
            .unwrap();
        let transport = Arc::new(InMemoryTransport::new());
        let gateway = OutboundGateway::new(AddressingResolver::new(registry), transport.clone());
        let messenger = SocketMessenger::new(gateway, Arc::new(LoggingDeliveryErrorHandler));
        let mut router = CommandRouter::new(messenger);
        router.register_command(Add);
        (router, transport)
    }

    fn sender() -> SocketUser {
        SocketUser::new(UserId::new("42").unwrap(), ConnectionId::parse("c1").unwrap())
    }

    fn stamped(name: &str, args: Value, needs_reply: bool) -> RequestEnvelope {
        let options = if needs_reply {
            CommandOptions::default().with_reply()
        } else {
            CommandOptions::default()
        };
        let mut request = RequestEnvelope::new(name, args, options).with_id("r1");
        request.stamp(&sender());
        request
    }

    #[tokio::test]
    async fn replies_with_result_when_asked() {
        let (router, transport) = router().await;

        let response = router
            .handle_request(stamped("add", json!({"a": 2, "b": 3}), true))
            .await
            .unwrap();

        assert_eq!(response.outcome, ResponseOutcome::Success(json!(5)));
        let frames = transport.frames_for(&sender().client_id);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data["id"], "r1");
        assert_eq!(frames[0].data["response"], 5);
    }

    #[tokio::test]
    async fn stays_silent_without_needs_reply() {
        let (router, transport) = router().await;
        let response = router
            .handle_request(stamped("add", json!({"a": 2, "b": 3}), false))
            .await;
        assert!(response.is_none());
        assert!(transport.recipients().is_empty());
    }

    #[tokio::test]
    async fn unknown_command_replies_error() {
        let (router, _) = router().await;
        let response = router
            .handle_request(stamped("nope", Value::Null, true))
            .await
            .unwrap();
        match response.outcome {
            ResponseOutcome::Failure(error) => assert_eq!(error.code, "UNKNOWN_COMMAND"),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn undecodable_args_reply_validation_error() {
        let (router, _) = router().await;
        let response = router
            .handle_request(stamped("add", json!({"a": "two"}), true))
            .await
            .unwrap();
        match response.outcome {
            ResponseOutcome::Failure(error) => assert_eq!(error.code, "VALIDATION_FAILED"),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unstamped_request_is_ignored() {
        let (router, transport) = router().await;
        let request = RequestEnvelope::new("add", json!({"a": 1, "b": 1}), CommandOptions::default().with_reply());
        assert!(router.handle_request(request).await.is_none());
        assert!(transport.recipients().is_empty());
    }

    #[tokio::test]
    async fn event_handler_runs_for_stamped_event() {
        let (mut router, _) = router().await;
        let count = Arc::new(AtomicUsize::new(0));
        router.register_event(Typing(count.clone()));

        let mut event = EventEnvelope::new("typing", Value::Null);
        event.stamp(&sender());
        router.handle_event(event).await;

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
