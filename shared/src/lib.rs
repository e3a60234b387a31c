//! Types shared between the pong server and its browser client.
//!
//! `config` holds the canonical playfield constants, `protocol` the JSON
//! messages exchanged over the WebSocket.

pub mod config;
pub mod protocol;
