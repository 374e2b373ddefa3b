use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use reqwest::Client;
use tokio::io::{AsyncBufReadExt, BufReader};

use voxpi::config::Config;
use voxpi::dispatch;
use voxpi::hw::{HwInterface, InputBackend};
use voxpi::logging;
use voxpi::tts::CommandSpeaker;

/// Voice-command dispatcher for a small home-automation board.
///
/// Recognized transcripts arrive on stdin, one per line; the speech
/// recognizer itself runs as a separate front end.
#[derive(Parser)]
#[command(name = "voxpi", version)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "voxpi.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = logging::init_logging() {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    tracing::info!("=== voxpi starting ===");

    let args = Args::parse();
    let config = Config::load(&args.config)?;

    // One hardware handle for the whole process; components borrow it
    let hw = Arc::new(HwInterface::new(input_backend()?));

    let http = Client::builder()
        .user_agent(concat!("voxpi/", env!("CARGO_PKG_VERSION")))
        .timeout(std::time::Duration::from_secs(30))
        .build()?;

    let speaker = Arc::new(CommandSpeaker::new(config.tts.command.clone()));
    let dispatcher = dispatch::build_dispatcher(&config, speaker, hw, http);
    tracing::info!(actions = dispatcher.len(), "Dispatch table ready");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let transcript = line.trim();
        if transcript.is_empty() {
            continue;
        }
        // A failed action must never take the assistant down with it
        if !dispatcher.dispatch(transcript).await {
            tracing::info!(transcript = %transcript, "No action for transcript");
        }
    }

    tracing::info!("voxpi shutting down");
    Ok(())
}

#[cfg(feature = "rpi")]
fn input_backend() -> Result<Arc<dyn InputBackend>> {
    Ok(Arc::new(voxpi::hw::rpi::GpioInput::new()?))
}

#[cfg(not(feature = "rpi"))]
fn input_backend() -> Result<Arc<dyn InputBackend>> {
    tracing::warn!("Built without the rpi feature, the cancel button is inert");
    Ok(Arc::new(voxpi::hw::SoftInput::new()))
}
