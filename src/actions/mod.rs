//! Voice-command actions outside the playback core.
//!
//! Each action is a small struct with a `run` method taking the command text
//! with the trigger keyword already stripped.

pub mod lights;
pub mod shell;
pub mod speak;
