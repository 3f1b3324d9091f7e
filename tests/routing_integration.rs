//! Integration tests for connection lifecycle and message routing.
//!
//! Drives `SocketServer` end to end over the in-memory transport:
//! handshake, inbound stamping, addressing fan-out, the room command and
//! disconnect cleanup.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use serde_json::{json, Value};

use socket_router::adapters::{InMemoryTransport, StaticTokenResolver};
use socket_router::application::SocketServer;
use socket_router::domain::connection::RoomName;
use socket_router::domain::envelope::{
    CommandOptions, EnvelopeKind, EventEnvelope, EventOptions, RequestEnvelope,
    TRANSPORT_SOCKET_COMMAND_RESPONSE_METHOD, TRANSPORT_SOCKET_CONNECTED, TRANSPORT_SOCKET_EVENT,
    TRANSPORT_SOCKET_EXCEPTION,
};
use socket_router::domain::foundation::{ConnectionId, UserId};
use socket_router::ports::{Handshake, SocketFrame};

// =============================================================================
// Test Infrastructure
// =============================================================================

struct Harness {
    server: Arc<SocketServer>,
    transport: Arc<InMemoryTransport>,
}

fn harness() -> Harness {
    let transport = Arc::new(InMemoryTransport::new());
    let resolver = StaticTokenResolver::new("token")
        .with_token("t42", "42")
        .with_token("t7", "7")
        .with_token("ta", "alice")
        .with_token("tb", "bob");
    let server = Arc::new(SocketServer::builder(transport.clone(), Arc::new(resolver)).build());
    Harness { server, transport }
}

fn conn(id: &str) -> ConnectionId {
    ConnectionId::parse(id).unwrap()
}

fn user(id: &str) -> UserId {
    UserId::new(id).unwrap()
}

impl Harness {
    async fn connect(&self, id: &str, token: &str) -> ConnectionId {
        let id = conn(id);
        self.server
            .handle_connection(Handshake::new(id.clone()).with_query("token", token))
            .await
            .unwrap();
        id
    }

    async fn send(&self, id: &ConnectionId, kind: EnvelopeKind, data: Value) -> bool {
        self.server
            .handle_frame(id, SocketFrame::new(kind.method(), data))
            .await
    }

    /// Waits until `id` has received a frame under `event`.
    async fn wait_for_frame(&self, id: &ConnectionId, event: &str) -> SocketFrame {
        let poll = async {
            loop {
                if let Some(frame) = self.transport.frames_with_event(id, event).pop() {
                    return frame;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        };
        tokio::time::timeout(Duration::from_secs(2), poll)
            .await
            .expect("frame not received in time")
    }
}

// =============================================================================
// Handshake
// =============================================================================

#[tokio::test]
async fn handshake_joins_reserved_room_and_acknowledges() {
    let h = harness();
    let c1 = h.connect("C1", "t42").await;

    let rooms = h.server.registry().rooms_of(&c1).await;
    assert_eq!(rooms, HashSet::from([RoomName::new("user42").unwrap()]));

    let ack = h.transport.frames_with_event(&c1, TRANSPORT_SOCKET_CONNECTED);
    assert_eq!(ack.len(), 1);
    assert_eq!(ack[0].data["userId"], "42");
    assert_eq!(ack[0].data["clientId"], "C1");
}

#[tokio::test]
async fn rejected_handshake_notifies_and_closes() {
    let h = harness();
    let bad = conn("bad");

    let result = h
        .server
        .handle_connection(Handshake::new(bad.clone()))
        .await;

    assert!(result.is_err());
    assert!(h.transport.was_closed(&bad));
    let errors = h.transport.frames_with_event(&bad, TRANSPORT_SOCKET_EXCEPTION);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].data["code"], "UNAUTHORIZED");
    assert!(errors[0].data["timestamp"].is_string());
    assert!(!h.server.registry().contains(&bad).await);

    // Never Active: traffic is dropped.
    assert!(
        !h.send(&bad, EnvelopeKind::Event, json!({"uid": "e1", "name": "x"}))
            .await
    );
}

// =============================================================================
// Outbound addressing
// =============================================================================

#[tokio::test]
async fn emit_to_user_reaches_every_device_of_that_user_only() {
    let h = harness();
    let c1 = h.connect("C1", "t42").await;
    let c2 = h.connect("C2", "t42").await;
    let _c3 = h.connect("C3", "t7").await;
    h.transport.clear();

    let report = h
        .server
        .emit_to_user(&user("42"), false, "notify", &json!({"n": 1}))
        .await
        .unwrap();

    assert_eq!(report.delivered, 2);
    assert_eq!(h.transport.recipients(), HashSet::from([c1, c2]));
}

#[tokio::test]
async fn joining_another_users_room_does_not_receive_their_messages() {
    let h = harness();
    let _router = h.server.spawn_router(h.server.command_router());
    let alice = h.connect("A", "ta").await;
    let bob = h.connect("B", "tb").await;

    h.send(
        &bob,
        EnvelopeKind::Request,
        json!({
            "id": "r1",
            "name": "TransportSocketRoomCommand",
            "request": {"name": "useralice", "action": "ADD"},
            "options": {"needsReply": true}
        }),
    )
    .await;
    h.wait_for_frame(&bob, TRANSPORT_SOCKET_COMMAND_RESPONSE_METHOD)
        .await;
    h.transport.clear();

    let report = h
        .server
        .emit_to_user(&user("alice"), false, "private", &json!("secret"))
        .await
        .unwrap();

    assert_eq!(report.delivered, 1);
    assert_eq!(h.transport.recipients(), HashSet::from([alice]));
}

#[tokio::test]
async fn emit_to_user_only_one_reaches_exactly_one_device() {
    let h = harness();
    for id in ["A", "B", "C"] {
        h.connect(id, "t42").await;
    }
    h.transport.clear();

    let report = h
        .server
        .emit_to_user(&user("42"), true, "notify", &json!(null))
        .await
        .unwrap();

    assert_eq!(report.delivered, 1);
    assert_eq!(h.transport.recipients().len(), 1);
}

#[tokio::test]
async fn emit_to_nobody_is_a_noop() {
    let h = harness();

    let to_user = h
        .server
        .emit_to_user(&user("999"), false, "notify", &json!(1))
        .await
        .unwrap();
    let to_room = h
        .server
        .emit_to_room(&RoomName::new("empty").unwrap(), "notify", &json!(1))
        .await
        .unwrap();

    assert_eq!(to_user.delivered, 0);
    assert_eq!(to_room.delivered, 0);
    assert!(h.transport.recipients().is_empty());
}

#[tokio::test]
async fn broadcast_event_reaches_everyone() {
    let h = harness();
    h.connect("C1", "t42").await;
    h.connect("C2", "t7").await;
    h.transport.clear();

    h.server
        .messenger()
        .send_event(&EventEnvelope::new("tick", json!(1)), &EventOptions::broadcast())
        .await
        .unwrap();

    assert_eq!(h.transport.recipients().len(), 2);
    let frame = &h.transport.frames_for(&conn("C1"))[0];
    assert_eq!(frame.event, TRANSPORT_SOCKET_EVENT);
    assert_eq!(frame.data["name"], "tick");
}

#[tokio::test]
async fn outbound_request_needs_exactly_one_target() {
    let h = harness();
    h.connect("C1", "t42").await;
    h.transport.clear();

    let untargeted = RequestEnvelope::new("ping", Value::Null, CommandOptions::default());
    assert!(h.server.messenger().send_request(&untargeted).await.is_err());
    assert!(h.transport.recipients().is_empty());

    let targeted = RequestEnvelope::new("ping", Value::Null, CommandOptions::to_user(user("42")));
    assert!(h.server.messenger().send_request(&targeted).await.is_ok());
    assert_eq!(h.transport.recipients().len(), 1);
}

// =============================================================================
// Inbound stamping
// =============================================================================

#[tokio::test]
async fn inbound_request_is_stamped_with_real_sender() {
    let h = harness();
    let mut requests = h.server.requests();
    let c1 = h.connect("C1", "t42").await;

    let published = h
        .send(
            &c1,
            EnvelopeKind::Request,
            json!({"id": "r1", "name": "ping", "options": {"clientId": "C9"}}),
        )
        .await;
    assert!(published);

    let request = requests.next().await.unwrap();
    assert_eq!(request.id, "r1");
    assert_eq!(request.options.client_id, Some(c1));
    assert_eq!(request.options.user_id, Some(user("42")));
}

#[tokio::test]
async fn inbound_envelopes_with_loosely_typed_fields_are_published() {
    let h = harness();
    let mut inbound = h.server.stream();
    let c1 = h.connect("C1", "t42").await;

    let frames = [
        (EnvelopeKind::Request, json!({"id": 7})),
        (EnvelopeKind::Request, json!({"id": "r2", "options": {"room": 5}})),
        (EnvelopeKind::Event, json!({"uid": 12})),
        (
            EnvelopeKind::Response,
            json!({"id": "r4", "error": {"code": 500, "message": "boom"}}),
        ),
        (EnvelopeKind::Response, json!({"id": "r5", "error": {"message": "boom"}})),
    ];
    for (kind, data) in frames {
        assert!(h.send(&c1, kind, data.clone()).await, "dropped {}", data);
    }

    let mut kinds = Vec::new();
    for _ in 0..5 {
        let message = inbound.next().await.unwrap();
        assert_eq!(message.sender().unwrap().client_id, c1);
        kinds.push(message.kind());
    }
    assert_eq!(
        kinds,
        vec![
            EnvelopeKind::Request,
            EnvelopeKind::Request,
            EnvelopeKind::Event,
            EnvelopeKind::Response,
            EnvelopeKind::Response,
        ]
    );
}

#[tokio::test]
async fn inbound_envelopes_without_correlation_id_publish_nothing() {
    let h = harness();
    let c1 = h.connect("C1", "t42").await;

    assert!(!h.send(&c1, EnvelopeKind::Event, json!({"name": "typing"})).await);
    assert!(!h.send(&c1, EnvelopeKind::Request, json!({"name": "ping"})).await);
    assert!(!h.send(&c1, EnvelopeKind::Response, Value::Null).await);
}

// =============================================================================
// Room command
// =============================================================================

#[tokio::test]
async fn room_command_on_reserved_room_is_forbidden() {
    let h = harness();
    let _router = h.server.spawn_router(h.server.command_router());
    let c1 = h.connect("C1", "t42").await;
    let before = h.server.registry().rooms_of(&c1).await;

    h.send(
        &c1,
        EnvelopeKind::Request,
        json!({
            "id": "r1",
            "name": "TransportSocketRoomCommand",
            "request": {"name": "user7", "action": "ADD"},
            "options": {"needsReply": true}
        }),
    )
    .await;

    let response = h
        .wait_for_frame(&c1, TRANSPORT_SOCKET_COMMAND_RESPONSE_METHOD)
        .await;
    assert_eq!(response.data["id"], "r1");
    assert_eq!(response.data["error"]["code"], "FORBIDDEN");
    assert_eq!(response.data["error"]["message"], "Forbidden \"user7\" room");
    assert_eq!(h.server.registry().rooms_of(&c1).await, before);
}

#[tokio::test]
async fn room_command_join_is_visible_and_routable() {
    let h = harness();
    let _router = h.server.spawn_router(h.server.command_router());
    let c1 = h.connect("C1", "t42").await;
    let _c2 = h.connect("C2", "t7").await;
    let lobby = RoomName::new("lobby").unwrap();

    h.send(
        &c1,
        EnvelopeKind::Request,
        json!({
            "id": "r1",
            "name": "TransportSocketRoomCommand",
            "request": {"name": "lobby", "action": "ADD"},
            "options": {"needsReply": true}
        }),
    )
    .await;

    let response = h
        .wait_for_frame(&c1, TRANSPORT_SOCKET_COMMAND_RESPONSE_METHOD)
        .await;
    assert!(response.data.get("error").is_none());
    assert!(h.server.registry().rooms_of(&c1).await.contains(&lobby));

    h.transport.clear();
    h.server.emit_to_room(&lobby, "chat", &json!("hi")).await.unwrap();
    assert_eq!(h.transport.recipients(), HashSet::from([c1]));
}

// =============================================================================
// Disconnect
// =============================================================================

#[tokio::test]
async fn emit_after_disconnect_is_a_noop() {
    let h = harness();
    let c1 = h.connect("C1", "t42").await;

    h.server.handle_disconnect(&c1).await;
    h.transport.clear();

    let report = h
        .server
        .emit_to_client(&c1, "notify", &json!(1))
        .await
        .unwrap();
    assert_eq!(report.delivered, 0);
    assert!(h.transport.recipients().is_empty());
    assert!(h.server.registry().rooms_of(&c1).await.is_empty());
}

#[tokio::test]
async fn frames_after_disconnect_are_dropped() {
    let h = harness();
    let c1 = h.connect("C1", "t42").await;
    h.server.handle_disconnect(&c1).await;

    assert!(
        !h.send(&c1, EnvelopeKind::Event, json!({"uid": "e1", "name": "typing"}))
            .await
    );
}
