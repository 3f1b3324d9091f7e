//! Outbound addressing: turning envelope options into a single target.

use thiserror::Error;

use crate::domain::connection::RoomName;
use crate::domain::foundation::{ConnectionId, UserId};

use super::{CommandOptions, EventOptions, ResponseEnvelope};

/// Where an outbound frame goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// One connection; silently dropped if it no longer exists.
    Client(ConnectionId),
    /// Every connection of a user, or one arbitrary connection when `only_one`.
    User { user_id: UserId, only_one: bool },
    /// Every member of a room.
    Room(RoomName),
    /// Every connection in the namespace.
    All,
}

/// Invalid addressing configuration, raised before any send attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressingError {
    #[error("Command options \"userId\", \"clientId\" or \"room\" must be set")]
    NoTarget,

    #[error("Only one of \"userId\", \"clientId\" or \"room\" may be set, got {0}")]
    AmbiguousTarget(usize),

    #[error("Command response \"clientId\" must be set")]
    MissingClientId,
}

impl Target {
    /// Requests need exactly one target.
    pub fn for_request(options: &CommandOptions) -> Result<Self, AddressingError> {
        from_parts(
            options.user_id.as_ref(),
            options.client_id.as_ref(),
            options.room.as_ref(),
            options.is_only_one,
        )?
        .ok_or(AddressingError::NoTarget)
    }

    /// Events take at most one target; none is a broadcast.
    pub fn for_event(options: &EventOptions) -> Result<Self, AddressingError> {
        Ok(from_parts(
            options.user_id.as_ref(),
            options.client_id.as_ref(),
            options.room.as_ref(),
            options.is_only_one,
        )?
        .unwrap_or(Target::All))
    }

    /// Responses go to exactly the requesting connection.
    pub fn for_response(response: &ResponseEnvelope) -> Result<Self, AddressingError> {
        response
            .client_id
            .clone()
            .map(Target::Client)
            .ok_or(AddressingError::MissingClientId)
    }
}

fn from_parts(
    user_id: Option<&UserId>,
    client_id: Option<&ConnectionId>,
    room: Option<&RoomName>,
    only_one: bool,
) -> Result<Option<Target>, AddressingError> {
    let count = [user_id.is_some(), client_id.is_some(), room.is_some()]
        .iter()
        .filter(|set| **set)
        .count();
    if count > 1 {
        return Err(AddressingError::AmbiguousTarget(count));
    }
    if let Some(user_id) = user_id {
        return Ok(Some(Target::User {
            user_id: user_id.clone(),
            only_one,
        }));
    }
    if let Some(client_id) = client_id {
        return Ok(Some(Target::Client(client_id.clone())));
    }
    Ok(room.cloned().map(Target::Room))
}
