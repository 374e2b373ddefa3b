//! The play-session state machine.
//!
//! `run(query)` walks Idle -> Searching -> Resolving -> Playing and then
//! blocks until one of three racing sources settles the session: the player
//! reports end-of-stream, the player reports a fault, or the physical cancel
//! button fires. The racers meet in an [`OutcomeCell`]: a compare-and-set
//! terminal-outcome slot where the first write wins and every later write is
//! a no-op. Callbacks never touch session fields directly; they only settle
//! the cell.
//!
//! The blocking wait carries no timeout on purpose: a stream that never ends
//! and is never cancelled blocks its session indefinitely.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

use crate::error::Error;
use crate::hw::CancelSwitch;
use crate::player::{MediaPlayer, PlayerEvent};
use crate::resolver::StreamResolver;
use crate::tts::SharedSpeaker;

/// Terminal outcome of a play session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    Failed,
    Cancelled,
}

const PENDING: u8 = 0;
const COMPLETED: u8 = 1;
const FAILED: u8 = 2;
const CANCELLED: u8 = 3;

/// First-write-wins terminal-outcome slot shared between the waiting session
/// and the callbacks racing to end it.
pub struct OutcomeCell {
    state: AtomicU8,
    notify: Notify,
}

impl Default for OutcomeCell {
    fn default() -> Self {
        Self::new()
    }
}

impl OutcomeCell {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(PENDING),
            notify: Notify::new(),
        }
    }

    /// Record a terminal outcome. Returns true for the winning write; losing
    /// writes change nothing.
    pub fn settle(&self, outcome: Outcome) -> bool {
        let value = match outcome {
            Outcome::Completed => COMPLETED,
            Outcome::Failed => FAILED,
            Outcome::Cancelled => CANCELLED,
        };
        let won = self
            .state
            .compare_exchange(PENDING, value, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok();
        if won {
            self.notify.notify_waiters();
        }
        won
    }

    pub fn get(&self) -> Option<Outcome> {
        match self.state.load(Ordering::SeqCst) {
            COMPLETED => Some(Outcome::Completed),
            FAILED => Some(Outcome::Failed),
            CANCELLED => Some(Outcome::Cancelled),
            _ => None,
        }
    }

    /// Block until the cell is settled. No timeout.
    pub async fn wait(&self) -> Outcome {
        loop {
            // Register interest before checking, so a settle between the
            // check and the await cannot be missed
            let notified = self.notify.notified();
            if let Some(outcome) = self.get() {
                return outcome;
            }
            notified.await;
        }
    }
}

/// Orchestrates one source's search -> resolve -> play -> wait pipeline.
///
/// The cancel button is bound once at construction; each session installs
/// its own outcome cell into the shared slot the button callback reads.
pub struct PlaySessionCoordinator {
    resolver: Arc<dyn StreamResolver>,
    player: Arc<dyn MediaPlayer>,
    speaker: SharedSpeaker,
    busy: AtomicBool,
    live: Arc<Mutex<Option<Arc<OutcomeCell>>>>,
}

impl PlaySessionCoordinator {
    pub fn new(
        resolver: Arc<dyn StreamResolver>,
        player: Arc<dyn MediaPlayer>,
        speaker: SharedSpeaker,
        cancel: Option<&CancelSwitch>,
    ) -> Arc<Self> {
        let coordinator = Arc::new(Self {
            resolver,
            player,
            speaker,
            busy: AtomicBool::new(false),
            live: Arc::new(Mutex::new(None)),
        });

        if let Some(switch) = cancel {
            let live = coordinator.live.clone();
            let armed = switch.arm(Arc::new(move || {
                let cell = live.lock().unwrap().clone();
                if let Some(cell) = cell
                    && cell.settle(Outcome::Cancelled)
                {
                    tracing::info!("Cancel button pressed");
                }
            }));
            if let Err(e) = armed {
                tracing::warn!(
                    error = %e,
                    channel = switch.channel(),
                    "Could not arm cancel button, sessions will not be cancellable"
                );
            }
        }

        coordinator
    }

    /// Run one play session to its terminal outcome.
    ///
    /// Every terminal state produces exactly one spoken sentence; failures
    /// end here and never propagate to the assistant loop.
    pub async fn run(&self, query: &str) -> Outcome {
        let query = query.trim();
        if query.is_empty() {
            self.speaker
                .say(&format!("Please specify a {}", self.resolver.subject()));
            return Outcome::Failed;
        }

        // One session at a time: a play command arriving mid-session is
        // rejected, not queued and not cancel-then-replaced
        if self.busy.swap(true, Ordering::SeqCst) {
            tracing::warn!(query, "Session already live, rejecting");
            self.speaker
                .say("Already playing, press the button to stop first");
            return Outcome::Failed;
        }
        let _guard = SessionGuard(self);

        tracing::info!(query, subject = self.resolver.subject(), "Session starting");

        let candidates = match self.resolver.search(query).await {
            Ok(candidates) => candidates,
            Err(e) => {
                self.report_search_failure(query, e);
                return Outcome::Failed;
            }
        };
        // Source ranking is trusted: always the first candidate
        let Some(first) = candidates.first() else {
            self.speaker.say(&format!("Failed to find {query}"));
            return Outcome::Failed;
        };

        let target = match self.resolver.resolve(first).await {
            Ok(target) => target,
            Err(e) => {
                self.report_search_failure(query, e);
                return Outcome::Failed;
            }
        };

        let cell = Arc::new(OutcomeCell::new());
        *self.live.lock().unwrap() = Some(cell.clone());

        self.speaker.say(&format!("Now playing {}", target.label));
        tracing::info!(label = %target.label, url = %target.url, "Now playing");

        let mut events = match self.player.start(&target).await {
            Ok(events) => events,
            Err(e) => {
                tracing::error!(error = %e, label = %target.label, "Start failed");
                self.speaker.say(&format!("Can't play {}", target.label));
                return Outcome::Failed;
            }
        };

        // Map the single terminal player event into the cell; if the cancel
        // press got there first this settle is a no-op
        {
            let cell = cell.clone();
            tokio::spawn(async move {
                let outcome = match events.recv().await {
                    Some(PlayerEvent::EndReached) => Outcome::Completed,
                    Some(PlayerEvent::PlaybackError) => Outcome::Failed,
                    // Sender gone without a terminal event: treat as a fault
                    None => Outcome::Failed,
                };
                cell.settle(outcome);
            });
        }

        // Blocks until completion, error or cancel; deliberately no timeout
        let outcome = cell.wait().await;
        match outcome {
            Outcome::Completed => {
                tracing::info!(label = %target.label, "Playback completed");
            }
            Outcome::Failed => {
                tracing::warn!(label = %target.label, "Playback failed");
                self.speaker.say(&format!("Can't play {}", target.label));
            }
            Outcome::Cancelled => {
                tracing::info!(label = %target.label, "Playback cancelled");
                self.player.stop().await;
            }
        }
        outcome
    }

    fn report_search_failure(&self, query: &str, error: Error) {
        tracing::warn!(query, error = %error, "Session failed before playback");
        match error {
            Error::NotFound(report) | Error::Resolution(report) => self.speaker.say(&report),
            _ => self.speaker.say(&format!("Failed to find {query}")),
        }
    }
}

/// Clears the live cell and the busy flag when a session ends, however it ends
struct SessionGuard<'a>(&'a PlaySessionCoordinator);

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        self.0.live.lock().unwrap().take();
        self.0.busy.store(false, Ordering::SeqCst);
    }
}
