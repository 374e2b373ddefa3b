//! Assistant configuration loaded from a TOML file.
//!
//! Every field has a default, so a missing file or a partial file both work;
//! the shipped defaults match the reference hardware (cancel button on
//! BCM channel 23, `amixer` volume, `cvlc` playback).

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Top-level assistant configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// BCM input channel wired to the physical cancel button
    #[serde(default = "default_cancel_channel")]
    pub cancel_channel: u8,

    #[serde(default)]
    pub tts: TtsConfig,

    #[serde(default)]
    pub player: PlayerConfig,

    #[serde(default)]
    pub video: VideoConfig,

    #[serde(default)]
    pub radio: RadioConfig,

    /// Optional smart-light bridge; light commands are skipped when absent
    #[serde(default)]
    pub hue: Option<HueConfig>,

    /// Canned trigger/response pairs registered alongside the built-in actions
    #[serde(default = "default_responses")]
    pub responses: Vec<CannedResponse>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cancel_channel: default_cancel_channel(),
            tts: TtsConfig::default(),
            player: PlayerConfig::default(),
            video: VideoConfig::default(),
            radio: RadioConfig::default(),
            hue: None,
            responses: default_responses(),
        }
    }
}

/// Text-to-speech command; the phrase is appended as the last argument
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsConfig {
    #[serde(default = "default_tts_command")]
    pub command: Vec<String>,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            command: default_tts_command(),
        }
    }
}

/// External media player command; the stream URL is appended as the last argument
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    #[serde(default = "default_player_command")]
    pub command: Vec<String>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            command: default_player_command(),
        }
    }
}

/// Video-sharing search settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoConfig {
    /// yt-dlp binary used for search and stream-URL extraction
    #[serde(default = "default_ytdlp_bin")]
    pub ytdlp_bin: String,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            ytdlp_bin: default_ytdlp_bin(),
        }
    }
}

/// Internet-radio directory settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RadioConfig {
    /// Directory base URL; overridable so tests can point at a mock server
    #[serde(default = "default_radio_base_url")]
    pub base_url: String,
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            base_url: default_radio_base_url(),
        }
    }
}

/// Philips-Hue-style bridge settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HueConfig {
    /// Bridge address, host or host:port
    pub bridge: String,
    /// API username registered on the bridge
    pub username: String,
    /// Voice-triggered color presets
    #[serde(default)]
    pub presets: Vec<LightPreset>,
}

/// One spoken color preset ("change to ocean blue" -> bulb + hex color)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LightPreset {
    pub keyword: String,
    pub bulb: String,
    pub hex_color: String,
}

/// A fixed spoken response bound to a trigger phrase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CannedResponse {
    pub keyword: String,
    pub response: String,
}

fn default_cancel_channel() -> u8 {
    23
}

fn default_tts_command() -> Vec<String> {
    vec!["espeak".to_string()]
}

fn default_player_command() -> Vec<String> {
    vec![
        "cvlc".to_string(),
        "--play-and-exit".to_string(),
        "--quiet".to_string(),
    ]
}

fn default_ytdlp_bin() -> String {
    "yt-dlp".to_string()
}

fn default_radio_base_url() -> String {
    "http://tunein.com".to_string()
}

fn default_responses() -> Vec<CannedResponse> {
    let pairs: &[(&str, &str)] = &[
        ("hello", "hello to you too"),
        ("tell me a joke", "What do you call an alligator in a vest? An investigator."),
        ("clap", "clap clap"),
        ("your name", "A machine has no name"),
        ("where are you from", "A galaxy far, far, just kidding. I'm from Seattle."),
    ];
    pairs
        .iter()
        .map(|(k, r)| CannedResponse {
            keyword: k.to_string(),
            response: r.to_string(),
        })
        .collect()
}

impl Config {
    /// Load configuration from a TOML file, falling back to defaults when the
    /// file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Config =
            toml::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))?;
        tracing::info!(path = %path.display(), "Config loaded");
        Ok(config)
    }
}
