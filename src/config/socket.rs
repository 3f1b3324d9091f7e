//! Socket endpoint configuration

use serde::Deserialize;

use super::error::ValidationError;

/// WebSocket endpoint and buffering configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SocketConfig {
    /// Route the WebSocket upgrade is served on
    #[serde(default = "default_path")]
    pub path: String,

    /// Messages buffered on the inbound bus per slow subscriber
    #[serde(default = "default_bus_capacity")]
    pub bus_capacity: usize,

    /// Outbound frames queued per connection before sends fail
    #[serde(default = "default_client_buffer")]
    pub client_buffer: usize,

    /// Query parameter carrying the bearer token
    #[serde(default = "default_token_param")]
    pub token_param: String,
}

impl SocketConfig {
    /// Validate socket configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.path.starts_with('/') {
            return Err(ValidationError::InvalidSocketPath);
        }
        if self.bus_capacity == 0 {
            return Err(ValidationError::ZeroCapacity("bus_capacity"));
        }
        if self.client_buffer == 0 {
            return Err(ValidationError::ZeroCapacity("client_buffer"));
        }
        if self.token_param.trim().is_empty() {
            return Err(ValidationError::EmptyTokenParam);
        }
        Ok(())
    }
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            bus_capacity: default_bus_capacity(),
            client_buffer: default_client_buffer(),
            token_param: default_token_param(),
        }
    }
}

fn default_path() -> String {
    "/socket".to_string()
}

fn default_bus_capacity() -> usize {
    1024
}

fn default_client_buffer() -> usize {
    256
}

fn default_token_param() -> String {
    "token".to_string()
}
