//! Stream resolution: free-text query -> ranked candidates -> playable URL.
//!
//! Two sources implement [`StreamResolver`]: the video-sharing search
//! ([`video::VideoResolver`]) and the internet-radio directory
//! ([`radio::RadioResolver`]). Resolvers only do network IO; they never
//! touch shared state.

mod radio;
mod video;

pub use radio::RadioResolver;
pub use video::VideoResolver;

use async_trait::async_trait;

use crate::error::Result;

/// One ranked search result from a media source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Source-specific identifier (station id, extracted stream URL, ...)
    pub id: String,
    /// Display title as returned by the source
    pub title: String,
}

/// A resolved, directly playable media URL plus its display label.
///
/// Scoped to one play session: created by a resolver, consumed once by the
/// playback controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamTarget {
    pub url: String,
    pub label: String,
}

/// Search-and-resolve contract shared by both media sources.
///
/// `search` returns candidates in source order; callers always take the
/// first one. Failures are single-shot: no resolver retries anything.
#[async_trait]
pub trait StreamResolver: Send + Sync {
    /// What a query names for this source ("song", "station"), used in the
    /// spoken "please specify a ..." prompt.
    fn subject(&self) -> &'static str;

    /// One search attempt; finite, not restartable.
    async fn search(&self, query: &str) -> Result<Vec<Candidate>>;

    /// Turn a candidate into something the player can open.
    async fn resolve(&self, candidate: &Candidate) -> Result<StreamTarget>;
}

/// Reduce a raw source title to plain spoken words: alphanumeric runs are
/// kept, underscores and punctuation become separators, tokens are joined by
/// single spaces.
pub fn sanitize_title(raw: &str) -> String {
    let mut words: Vec<&str> = Vec::new();
    let mut start = None;
    for (i, c) in raw.char_indices() {
        if c.is_alphanumeric() {
            if start.is_none() {
                start = Some(i);
            }
        } else if let Some(s) = start.take() {
            words.push(&raw[s..i]);
        }
    }
    if let Some(s) = start {
        words.push(&raw[s..]);
    }
    words.join(" ")
}
