//! Shared test doubles for the play-session scenarios.
#![allow(dead_code)] // not every suite uses every double

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use voxpi::error::{Error, Result};
use voxpi::player::{MediaPlayer, PlayerEvent, PlayerEventReceiver};
use voxpi::resolver::{Candidate, StreamResolver, StreamTarget, sanitize_title};
use voxpi::tts::Speaker;

/// Speaker that records every sentence
pub struct RecordingSpeaker {
    spoken: Mutex<Vec<String>>,
}

impl RecordingSpeaker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            spoken: Mutex::new(vec![]),
        })
    }

    pub fn lines(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }
}

impl Speaker for RecordingSpeaker {
    fn say(&self, text: &str) {
        self.spoken.lock().unwrap().push(text.to_string());
    }
}

enum SearchScript {
    Hits(Vec<Candidate>),
    Fail(String),
}

/// Resolver whose search outcome is fixed up front
pub struct ScriptedResolver {
    script: SearchScript,
    pub searches: AtomicUsize,
}

impl ScriptedResolver {
    pub fn hit(title: &str, url: &str) -> Arc<Self> {
        Arc::new(Self {
            script: SearchScript::Hits(vec![Candidate {
                id: url.to_string(),
                title: title.to_string(),
            }]),
            searches: AtomicUsize::new(0),
        })
    }

    pub fn empty() -> Arc<Self> {
        Arc::new(Self {
            script: SearchScript::Hits(vec![]),
            searches: AtomicUsize::new(0),
        })
    }

    pub fn failing(report: &str) -> Arc<Self> {
        Arc::new(Self {
            script: SearchScript::Fail(report.to_string()),
            searches: AtomicUsize::new(0),
        })
    }

    pub fn search_count(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StreamResolver for ScriptedResolver {
    fn subject(&self) -> &'static str {
        "song"
    }

    async fn search(&self, _query: &str) -> Result<Vec<Candidate>> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            SearchScript::Hits(candidates) => Ok(candidates.clone()),
            SearchScript::Fail(report) => Err(Error::NotFound(report.clone())),
        }
    }

    async fn resolve(&self, candidate: &Candidate) -> Result<StreamTarget> {
        Ok(StreamTarget {
            url: candidate.id.clone(),
            label: sanitize_title(&candidate.title),
        })
    }
}

/// Player whose terminal event is fired by the test
pub struct FakePlayer {
    starts: AtomicUsize,
    stops: AtomicUsize,
    sender: Mutex<Option<mpsc::UnboundedSender<PlayerEvent>>>,
}

impl FakePlayer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            starts: AtomicUsize::new(0),
            stops: AtomicUsize::new(0),
            sender: Mutex::new(None),
        })
    }

    pub fn start_count(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    /// Deliver the session's terminal player event
    pub fn fire(&self, event: PlayerEvent) {
        if let Some(sender) = self.sender.lock().unwrap().as_ref() {
            let _ = sender.send(event);
        }
    }

    /// Block until the coordinator has started playback
    pub async fn wait_until_started(&self) {
        for _ in 0..200 {
            if self.start_count() > 0 {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        panic!("player never started");
    }
}

#[async_trait]
impl MediaPlayer for FakePlayer {
    async fn start(&self, _target: &StreamTarget) -> Result<PlayerEventReceiver> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.sender.lock().unwrap() = Some(tx);
        self.starts.fetch_add(1, Ordering::SeqCst);
        Ok(rx)
    }

    async fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}
