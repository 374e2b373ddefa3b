//! Text-to-speech sink.
//!
//! Every user-visible outcome is reported through [`Speaker::say`]; the
//! production implementation shells out to a configured TTS command and does
//! not wait for it, so speaking never blocks the session state machine.

use std::process::{Command, Stdio};
use std::sync::Arc;

/// Fire-and-forget text-to-speech sink
pub trait Speaker: Send + Sync {
    fn say(&self, text: &str);
}

/// Shared speaker handle
pub type SharedSpeaker = Arc<dyn Speaker>;

/// Speaker backed by an external TTS command (`espeak` by default).
///
/// The phrase is appended as the last argument and the child is detached;
/// a missing binary is logged, never surfaced to the caller.
pub struct CommandSpeaker {
    command: Vec<String>,
}

impl CommandSpeaker {
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }
}

impl Speaker for CommandSpeaker {
    fn say(&self, text: &str) {
        let Some((program, args)) = self.command.split_first() else {
            tracing::warn!("TTS command is empty, dropping speech");
            return;
        };
        tracing::info!(text, "say");
        let spawned = Command::new(program)
            .args(args)
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
        if let Err(e) = spawned {
            tracing::error!(error = %e, program = %program, "Failed to spawn TTS command");
        }
    }
}
