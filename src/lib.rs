//! voxpi - keyword-driven voice assistant actions for a small embedded board.
//!
//! The interesting part lives in [`session`]: a play-session state machine
//! that searches a remote source, resolves a playable stream, starts an
//! external player and then blocks until the stream ends, the player fails,
//! or a physical cancel button is pressed.

pub mod actions;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod hw;
pub mod logging;
pub mod player;
pub mod resolver;
pub mod session;
pub mod tts;
