//! Broadcast inbound bus.
//!
//! One ordered multiplexed stream of stamped envelopes, backed by a tokio
//! `broadcast` channel. Each subscriber gets every message published after
//! it subscribed. Subscribers that fall behind skip ahead and log a warning.
//!
//! ```text
//! conn-a ─┐                       ┌─> events()    (EventEnvelope)
//! conn-b ─┼─> publish ─> channel ─┼─> requests()  (RequestEnvelope)
//! conn-c ─┘                       └─> responses() (ResponseEnvelope)
//! ```

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use tokio::sync::broadcast::{self, error::RecvError};

use crate::domain::envelope::{EventEnvelope, InboundMessage, RequestEnvelope, ResponseEnvelope};
use crate::ports::InboundPublisher;

/// In-process bus for inbound traffic.
#[derive(Debug, Clone)]
pub struct BroadcastInboundBus {
    sender: broadcast::Sender<InboundMessage>,
}

impl BroadcastInboundBus {
    /// Creates a bus buffering up to `capacity` messages per slow subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Raw receiver over every inbound message.
    pub fn subscribe(&self) -> broadcast::Receiver<InboundMessage> {
        self.sender.subscribe()
    }

    /// Every inbound message, in publish order.
    pub fn stream(&self) -> BoxStream<'static, InboundMessage> {
        receiver_stream(self.subscribe()).boxed()
    }

    /// Inbound events only.
    pub fn events(&self) -> BoxStream<'static, EventEnvelope> {
        receiver_stream(self.subscribe())
            .filter_map(|message| async move {
                match message {
                    InboundMessage::Event(event) => Some(event),
                    _ => None,
                }
            })
            .boxed()
    }

    /// Inbound command requests only.
    pub fn requests(&self) -> BoxStream<'static, RequestEnvelope> {
        receiver_stream(self.subscribe())
            .filter_map(|message| async move {
                match message {
                    InboundMessage::Request(request) => Some(request),
                    _ => None,
                }
            })
            .boxed()
    }

    /// Inbound command responses only.
    pub fn responses(&self) -> BoxStream<'static, ResponseEnvelope> {
        receiver_stream(self.subscribe())
            .filter_map(|message| async move {
                match message {
                    InboundMessage::Response(response) => Some(response),
                    _ => None,
                }
            })
            .boxed()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for BroadcastInboundBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[async_trait]
impl InboundPublisher for BroadcastInboundBus {
    async fn publish(&self, message: InboundMessage) {
        if self.sender.send(message).is_err() {
            tracing::trace!("Inbound message dropped, no subscribers");
        }
    }
}

fn receiver_stream(
    receiver: broadcast::Receiver<InboundMessage>,
) -> impl futures::Stream<Item = InboundMessage> + Send + 'static {
    stream::unfold(receiver, |mut receiver| async move {
        loop {
            match receiver.recv().await {
                Ok(message) => return Some((message, receiver)),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Inbound subscriber lagged, messages skipped");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    })
}
