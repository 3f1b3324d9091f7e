//! WebSocket upgrade handler.
//!
//! Handles the HTTP → WebSocket upgrade and drives one connection through
//! the socket server:
//! 1. Assign a connection id and attach its outbound queue
//! 2. Collect query parameters and headers into a `Handshake`
//! 3. Run the handshake (acknowledgement or error + close)
//! 4. Feed text frames to the server until either side closes, watching
//!    for a dropped link from the start
//! 5. Run the disconnect path and detach the queue

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::HeaderMap,
    response::Response,
    routing::get,
    Router,
};
use futures::{
    stream::{SplitSink, SplitStream},
    SinkExt, StreamExt,
};
use tokio::sync::mpsc;

use crate::application::SocketServer;
use crate::domain::foundation::ConnectionId;
use crate::ports::{Handshake, SocketFrame};

use super::transport::{Outgoing, WebSocketTransport};

/// State required for WebSocket handling.
#[derive(Clone)]
pub struct WebSocketState {
    pub server: Arc<SocketServer>,
    pub transport: Arc<WebSocketTransport>,
}

impl WebSocketState {
    pub fn new(server: Arc<SocketServer>, transport: Arc<WebSocketTransport>) -> Self {
        Self { server, transport }
    }
}

/// Handle WebSocket upgrade requests.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    State(state): State<WebSocketState>,
) -> Response {
    let headers = headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
        })
        .collect();

    ws.on_upgrade(move |socket| handle_socket(socket, query, headers, state))
}

/// Runs for the lifetime of one connection.
///
/// The reader starts before the handshake so a link dropped mid-handshake
/// still reaches the disconnect path.
async fn handle_socket(
    socket: WebSocket,
    query: HashMap<String, String>,
    headers: HashMap<String, String>,
    state: WebSocketState,
) {
    let connection_id = ConnectionId::new();
    let (sink, stream) = socket.split();

    let outgoing = state.transport.attach(&connection_id).await;
    let mut writer = tokio::spawn(write_loop(sink, outgoing, connection_id.clone()));
    let mut reader = tokio::spawn(read_loop(
        stream,
        state.server.clone(),
        connection_id.clone(),
    ));

    let handshake = Handshake {
        connection_id: connection_id.clone(),
        query,
        headers,
    };
    let handshake = state.server.handle_connection(handshake);
    tokio::pin!(handshake);

    let accepted = tokio::select! {
        result = &mut handshake => result.is_ok(),
        _ = &mut reader => {
            tracing::debug!(connection_id = %connection_id, "Link dropped during handshake");
            state.server.handle_disconnect(&connection_id).await;
            let _ = handshake.await;
            writer.abort();
            state.transport.detach(&connection_id).await;
            return;
        }
    };
    if !accepted {
        // The error notification and close are already queued.
        let _ = writer.await;
        reader.abort();
        state.transport.detach(&connection_id).await;
        return;
    }

    tokio::select! {
        _ = &mut writer => {
            reader.abort();
        }
        _ = &mut reader => {
            writer.abort();
        }
    }

    state.server.handle_disconnect(&connection_id).await;
    state.transport.detach(&connection_id).await;
}

/// Feeds text frames to the server until the client closes or errors.
///
/// Frames that arrive before the handshake completes are dropped by the
/// server, since the connection is not Active yet.
async fn read_loop(
    mut stream: SplitStream<WebSocket>,
    server: Arc<SocketServer>,
    connection_id: ConnectionId,
) {
    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Text(text)) => match serde_json::from_str::<SocketFrame>(&text) {
                Ok(frame) => {
                    server.handle_frame(&connection_id, frame).await;
                }
                Err(e) => {
                    tracing::debug!(connection_id = %connection_id, "Dropping unparsable frame: {}", e);
                }
            },
            Ok(Message::Binary(_)) => {
                tracing::warn!(connection_id = %connection_id, "Received unsupported binary message");
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {
                // Protocol keepalive, answered by axum
            }
            Ok(Message::Close(_)) => {
                tracing::debug!(connection_id = %connection_id, "Client sent close frame");
                break;
            }
            Err(e) => {
                tracing::debug!(connection_id = %connection_id, "Receive error: {}", e);
                break;
            }
        }
    }
}

async fn write_loop(
    mut sink: SplitSink<WebSocket, Message>,
    mut outgoing: mpsc::Receiver<Outgoing>,
    connection_id: ConnectionId,
) {
    while let Some(item) = outgoing.recv().await {
        match item {
            Outgoing::Frame(text) => {
                if let Err(e) = sink.send(Message::Text(text)).await {
                    tracing::debug!(connection_id = %connection_id, "Send error, closing connection: {}", e);
                    break;
                }
            }
            Outgoing::Close => {
                let _ = sink.send(Message::Close(None)).await;
                break;
            }
        }
    }
}

/// Create axum router serving the socket endpoint at `path`.
///
/// # Example
///
/// ```ignore
/// let app = socket_router("/socket")
///     .with_state(WebSocketState::new(server, transport));
/// ```
pub fn socket_router(path: &str) -> Router<WebSocketState> {
    Router::new().route(path, get(ws_handler))
}
