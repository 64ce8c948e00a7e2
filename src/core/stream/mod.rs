//! Authenticated streaming sessions.
//!
//! `machine` holds the pure handshake/merge transitions, `reconnect` the
//! backoff schedule and `client` the tokio task that drives both over a
//! WebSocket.

pub mod client;
pub mod machine;
pub mod reconnect;

pub use client::{LiveStreamClient, StreamConfig};
pub use machine::{Action, StreamEvent, StreamMachine};
pub use reconnect::ReconnectPolicy;
