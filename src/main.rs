//! Socket router binary.
//!
//! Loads configuration, wires the WebSocket substrate to the socket server
//! and serves it until the process is stopped.

use std::sync::Arc;

use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use socket_router::adapters::{
    socket_router, StaticTokenResolver, WebSocketState, WebSocketTransport,
};
use socket_router::application::SocketServer;
use socket_router::config::AppConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    init_tracing(&config);

    let transport = Arc::new(WebSocketTransport::new(config.socket.client_buffer));
    let resolver = Arc::new(StaticTokenResolver::from_pairs(
        config.socket.token_param.clone(),
        config.identity.token_pairs()?,
    ));
    if resolver.token_count() == 0 {
        tracing::warn!("No identity tokens configured, every handshake will be rejected");
    }

    let server = Arc::new(
        SocketServer::builder(transport.clone(), resolver)
            .bus_capacity(config.socket.bus_capacity)
            .build(),
    );
    let router_task = server.spawn_router(server.command_router());

    let app = socket_router(&config.socket.path)
        .with_state(WebSocketState::new(server, transport))
        .layer(TraceLayer::new_for_http());

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
        tracing::error!(%addr, "Failed to bind: {}", e);
        e
    })?;
    tracing::info!(%addr, path = %config.socket.path, "Socket router listening");

    axum::serve(listener, app).await?;
    router_task.abort();
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if config.is_production() {
        builder.json().init();
    } else {
        builder.init();
    }
}
