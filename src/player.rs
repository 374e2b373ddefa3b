//! Playback controller driving an external player process.
//!
//! `start` spawns the configured player with the stream URL appended and
//! returns immediately; a watcher task reaps the process and delivers
//! exactly one terminal [`PlayerEvent`] per session over the channel that
//! `start` hands back. Waiting for that event is the session coordinator's
//! job, not this module's.

use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::{Child, Command};
use tokio::sync::{Mutex, mpsc};

use crate::error::{Error, Result};
use crate::resolver::StreamTarget;

/// Terminal playback event; one per session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerEvent {
    /// The stream ended on its own (or was stopped)
    EndReached,
    /// The player reported a runtime fault; not retried
    PlaybackError,
}

pub type PlayerEventReceiver = mpsc::UnboundedReceiver<PlayerEvent>;

/// URL-based media player: async start/stop plus a terminal-event channel
#[async_trait]
pub trait MediaPlayer: Send + Sync {
    /// Begin playback and return the session's terminal-event receiver.
    async fn start(&self, target: &StreamTarget) -> Result<PlayerEventReceiver>;

    /// Stop playback. Idempotent; safe before, during and after a session.
    async fn stop(&self);
}

struct Session {
    child_slot: Arc<Mutex<Option<Child>>>,
    stopped: Arc<AtomicBool>,
}

/// Player backed by an external process (`cvlc --play-and-exit` style)
pub struct ProcessPlayer {
    command: Vec<String>,
    current: Mutex<Option<Session>>,
}

/// How often the watcher checks whether the player process is gone
const REAP_INTERVAL: Duration = Duration::from_millis(200);

impl ProcessPlayer {
    pub fn new(command: Vec<String>) -> Self {
        Self {
            command,
            current: Mutex::new(None),
        }
    }

    fn spawn_watcher(
        child_slot: Arc<Mutex<Option<Child>>>,
        stopped: Arc<AtomicBool>,
        events: mpsc::UnboundedSender<PlayerEvent>,
    ) {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(REAP_INTERVAL);
            loop {
                interval.tick().await;
                let mut slot = child_slot.lock().await;
                let Some(child) = slot.as_mut() else {
                    return;
                };
                match child.try_wait() {
                    Ok(Some(status)) => {
                        *slot = None;
                        let event = if stopped.load(Ordering::SeqCst) || status.success() {
                            PlayerEvent::EndReached
                        } else {
                            tracing::warn!(status = ?status.code(), "Player exited with error");
                            PlayerEvent::PlaybackError
                        };
                        let _ = events.send(event);
                        return;
                    }
                    Ok(None) => {}
                    Err(e) => {
                        tracing::error!(error = %e, "Lost track of player process");
                        *slot = None;
                        let _ = events.send(PlayerEvent::PlaybackError);
                        return;
                    }
                }
            }
        });
    }

    async fn kill_session(session: &Session) {
        session.stopped.store(true, Ordering::SeqCst);
        let mut slot = session.child_slot.lock().await;
        if let Some(child) = slot.as_mut() {
            let _ = child.start_kill();
        }
    }
}

#[async_trait]
impl MediaPlayer for ProcessPlayer {
    async fn start(&self, target: &StreamTarget) -> Result<PlayerEventReceiver> {
        let Some((program, args)) = self.command.split_first() else {
            return Err(Error::Playback);
        };

        let mut current = self.current.lock().await;
        if let Some(previous) = current.take() {
            tracing::warn!("Player still active, replacing previous session");
            Self::kill_session(&previous).await;
        }

        tracing::info!(url = %target.url, label = %target.label, "Starting playback");
        let child = Command::new(program)
            .args(args)
            .arg(&target.url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                tracing::error!(error = %e, program = %program, "Failed to spawn player");
                Error::Playback
            })?;

        let child_slot = Arc::new(Mutex::new(Some(child)));
        let stopped = Arc::new(AtomicBool::new(false));
        let (tx, rx) = mpsc::unbounded_channel();
        Self::spawn_watcher(child_slot.clone(), stopped.clone(), tx);

        *current = Some(Session {
            child_slot,
            stopped,
        });
        Ok(rx)
    }

    async fn stop(&self) {
        let current = self.current.lock().await;
        match current.as_ref() {
            Some(session) => {
                tracing::debug!("Stop requested");
                Self::kill_session(session).await;
            }
            None => tracing::debug!("Stop requested with no active session"),
        }
        // The watcher reaps the child and emits the terminal event
    }
}
