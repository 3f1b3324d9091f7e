//! Domain layer: connection identity, rooms and the envelope protocol.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (ids, errors, timestamps, state machine)
//! - `connection` - Connection record, lifecycle states and room names
//! - `envelope` - Event/request/response envelopes and outbound addressing

pub mod connection;
pub mod envelope;
pub mod foundation;
