//! Socket Router - Real-time message routing over persistent client sockets
//!
//! Binds every connection to an authenticated user, carries command
//! requests, command responses and events in typed envelopes, and fans
//! outbound traffic out to connections, users, rooms or everyone.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
