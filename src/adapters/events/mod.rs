//! Inbound bus adapters.
//!
//! - `BroadcastInboundBus` - In-process ordered bus with per-kind sub-streams

mod broadcast_bus;

pub use broadcast_bus::BroadcastInboundBus;
