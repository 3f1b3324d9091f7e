//! Connection lifecycle states.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::StateMachine;

/// Lifecycle of a single client connection.
///
/// ```text
/// Connecting ──► Handshaking ──► Active ──► Disconnecting ──► Closed
///      │              │  └──────────────────────▲
///      └──────────────┴──────────────────────────────────────► Closed
/// ```
///
/// Only `Active` connections have listeners attached; frames arriving in
/// any other state are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// Transport-level link exists, `on_connect` hook not yet run.
    Connecting,
    /// Identity is being resolved.
    Handshaking,
    /// Identity bound, listeners attached, traffic accepted.
    Active,
    /// Teardown in progress.
    Disconnecting,
    /// Link severed, memberships purged.
    Closed,
}

impl ConnectionState {
    /// Whether inbound envelopes are dispatched in this state.
    pub fn accepts_traffic(&self) -> bool {
        matches!(self, ConnectionState::Active)
    }
}

impl StateMachine for ConnectionState {
    fn can_transition_to(&self, target: &Self) -> bool {
        use ConnectionState::*;
        matches!(
            (self, target),
            (Connecting, Handshaking)
                | (Connecting, Closed)
                | (Handshaking, Active)
                | (Handshaking, Disconnecting)
                | (Handshaking, Closed)
                | (Active, Disconnecting)
                | (Disconnecting, Closed)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use ConnectionState::*;
        match self {
            Connecting => vec![Handshaking, Closed],
            Handshaking => vec![Active, Disconnecting, Closed],
            Active => vec![Disconnecting],
            Disconnecting => vec![Closed],
            Closed => vec![],
        }
    }
}
