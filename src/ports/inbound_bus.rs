//! InboundPublisher port - Where stamped inbound envelopes are published.

use async_trait::async_trait;

use crate::domain::envelope::InboundMessage;

/// Port for the single ordered stream of inbound traffic.
///
/// Publishing with no subscribers is not an error; the message is dropped.
#[async_trait]
pub trait InboundPublisher: Send + Sync {
    async fn publish(&self, message: InboundMessage);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn InboundPublisher) {}
}
