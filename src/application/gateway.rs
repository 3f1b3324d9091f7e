//! Outbound gateway: serialize once, fan out concurrently.

use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;

use crate::domain::connection::RoomName;
use crate::domain::envelope::Target;
use crate::domain::foundation::{ConnectionId, UserId};
use crate::ports::{DeliveryError, SocketFrame, SocketTransport};

use super::AddressingResolver;

/// Result of a fan-out in which every send went through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
}

/// Delivers frames to resolved targets through the transport.
///
/// One failed send never prevents the others; failures are collected and
/// returned once every send has completed.
#[derive(Clone)]
pub struct OutboundGateway {
    resolver: AddressingResolver,
    transport: Arc<dyn SocketTransport>,
}

impl OutboundGateway {
    pub fn new(resolver: AddressingResolver, transport: Arc<dyn SocketTransport>) -> Self {
        Self {
            resolver,
            transport,
        }
    }

    /// Sends `payload` under wire method `event` to every connection `target`
    /// resolves to. Zero recipients is a successful no-op.
    pub async fn emit_to<T>(
        &self,
        target: &Target,
        event: &str,
        payload: &T,
    ) -> Result<DeliveryReport, DeliveryError>
    where
        T: Serialize + ?Sized,
    {
        let data = serde_json::to_value(payload)
            .map_err(|e| DeliveryError::Serialization(e.to_string()))?;
        let frame = Arc::new(SocketFrame::new(event, data));
        let recipients = self.resolver.resolve(target).await;
        self.send_all(&recipients, frame).await
    }

    /// Broadcast to every connection.
    pub async fn emit<T>(&self, event: &str, payload: &T) -> Result<DeliveryReport, DeliveryError>
    where
        T: Serialize + ?Sized,
    {
        self.emit_to(&Target::All, event, payload).await
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
        self.emit_to(&Target::Client(connection_id.clone()), event, payload)
            .await
    }

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
        let target = Target::User {
            user_id: user_id.clone(),
            only_one,
        };
        self.emit_to(&target, event, payload).await
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
        self.emit_to(&Target::Room(room.clone()), event, payload)
            .await
    }

    async fn send_all(
        &self,
        recipients: &[ConnectionId],
        frame: Arc<SocketFrame>,
    ) -> Result<DeliveryReport, DeliveryError> {
        if recipients.is_empty() {
            tracing::debug!(event = %frame.event, "No recipients, nothing to send");
            return Ok(DeliveryReport::default());
        }

        let sends = recipients.iter().map(|id| {
            let frame = Arc::clone(&frame);
            async move { (id, self.transport.send(id, frame).await) }
        });

        let mut delivered = 0;
        let mut failures = Vec::new();
        for (id, result) in join_all(sends).await {
            match result {
                Ok(()) => delivered += 1,
                Err(e) => {
                    tracing::warn!(connection_id = %id, event = %frame.event, "Send failed: {}", e);
                    failures.push((id.clone(), e));
                }
            }
        }

        if failures.is_empty() {
            Ok(DeliveryReport { delivered })
        } else {
            Err(DeliveryError::Partial {
                delivered,
                failures,
            })
        }
    }
}
