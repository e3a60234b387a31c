//! Pong server library.
//!
//! This module exposes the server components for use in tests and binaries.

pub mod ball;
pub mod config;
pub mod game;
pub mod game_loop;
pub mod gateway;
pub mod player;
pub mod ws;
