//! Error types for the playback core

/// Result type alias for play-session operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can end a play session.
///
/// The string payloads of [`Error::NotFound`] and [`Error::Resolution`] are
/// the sentence the assistant speaks for that failure; each source phrases
/// its own apologies ("Failed to find ...", "Didn't find any stations").
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The command carried no query text after the keyword was stripped
    #[error("empty query")]
    EmptyQuery,

    /// Search produced nothing playable
    #[error("{0}")]
    NotFound(String),

    /// A candidate could not be turned into a playable stream
    #[error("{0}")]
    Resolution(String),

    /// The player reported a runtime fault
    #[error("playback failed")]
    Playback,

    /// The user pressed the cancel button
    #[error("cancelled")]
    Cancelled,

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid URL
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
