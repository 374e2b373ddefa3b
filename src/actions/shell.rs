//! Actions that shell out: command output readback, volume, power.

use tokio::process::Command;

use crate::tts::SharedSpeaker;

/// Runs a shell command and speaks its trimmed output, or a fallback
/// sentence when the command prints nothing.
pub struct SpeakShellCommandOutput {
    speaker: SharedSpeaker,
    shell_command: String,
    failure_text: Option<String>,
}

impl SpeakShellCommandOutput {
    pub fn new(
        speaker: SharedSpeaker,
        shell_command: impl Into<String>,
        failure_text: Option<String>,
    ) -> Self {
        Self {
            speaker,
            shell_command: shell_command.into(),
            failure_text,
        }
    }

    pub async fn run(&self, _rest: &str) {
        let output = match Command::new("sh")
            .arg("-c")
            .arg(&self.shell_command)
            .output()
            .await
        {
            Ok(output) => output,
            Err(e) => {
                tracing::error!(error = %e, command = %self.shell_command, "Shell command failed");
                return;
            }
        };

        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if !text.is_empty() {
            self.speaker.say(&text);
        } else if let Some(failure_text) = &self.failure_text {
            self.speaker.say(failure_text);
        }
    }
}

const GET_VOLUME: &str =
    r#"amixer get Master | grep "Front Left:" | sed "s/.*\[\([0-9]\+\)%\].*/\1/""#;

/// What a volume phrase asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeRequest {
    Up,
    Down,
    Max,
    Mute,
    Set(i64),
    /// Bare "volume": just report the current level
    Tell,
}

/// Parse the remainder of a volume command. `None` means the phrase had
/// neither a known mode nor a number in it.
pub fn parse_volume_request(rest: &str) -> Option<VolumeRequest> {
    let rest = rest.trim();
    match rest {
        "" => Some(VolumeRequest::Tell),
        "up" => Some(VolumeRequest::Up),
        "down" => Some(VolumeRequest::Down),
        "max" => Some(VolumeRequest::Max),
        "mute" => Some(VolumeRequest::Mute),
        other => {
            let digits: String = other
                .chars()
                .skip_while(|c| !c.is_ascii_digit())
                .take_while(|c| c.is_ascii_digit())
                .collect();
            digits.parse().ok().map(VolumeRequest::Set)
        }
    }
}

fn clamp_volume(value: i64) -> i64 {
    value.clamp(0, 100)
}

/// Adjusts the mixer level via `amixer` and says the new level
pub struct VolumeControl {
    speaker: SharedSpeaker,
}

impl VolumeControl {
    /// Relative step for "volume up" / "volume down"
    const STEP: i64 = 10;

    pub fn new(speaker: SharedSpeaker) -> Self {
        Self { speaker }
    }

    pub async fn run(&self, rest: &str) {
        let Some(request) = parse_volume_request(rest) else {
            self.speaker.say("Please specify a value.");
            return;
        };

        let level = match request {
            VolumeRequest::Up => self.adjust(Self::STEP).await,
            VolumeRequest::Down => self.adjust(-Self::STEP).await,
            VolumeRequest::Max => self.set(100).await,
            VolumeRequest::Mute => self.set(0).await,
            VolumeRequest::Set(value) => self.set(clamp_volume(value)).await,
            VolumeRequest::Tell => self.current().await,
        };

        match level {
            Some(level) => self.speaker.say(&format!("Volume at {level} %.")),
            None => tracing::error!("Could not determine mixer level"),
        }
    }

    async fn adjust(&self, delta: i64) -> Option<i64> {
        let current = self.current().await?;
        self.set(clamp_volume(current + delta)).await
    }

    async fn current(&self) -> Option<i64> {
        let output = Command::new("sh")
            .arg("-c")
            .arg(GET_VOLUME)
            .output()
            .await
            .ok()?;
        String::from_utf8_lossy(&output.stdout).trim().parse().ok()
    }

    async fn set(&self, value: i64) -> Option<i64> {
        let command = format!("amixer -q set Master {value}%");
        match Command::new("sh").arg("-c").arg(&command).status().await {
            Ok(status) if status.success() => {
                tracing::info!(volume = value, "Volume set");
                Some(value)
            }
            Ok(status) => {
                tracing::error!(status = ?status.code(), "amixer exited non-zero");
                None
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to run amixer");
                None
            }
        }
    }
}

/// Shutdown or reboot the host, with a spoken goodbye first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerMode {
    Shutdown,
    Restart,
}

pub struct PowerCommand {
    speaker: SharedSpeaker,
    mode: PowerMode,
}

impl PowerCommand {
    pub fn new(speaker: SharedSpeaker, mode: PowerMode) -> Self {
        Self { speaker, mode }
    }

    pub async fn run(&self, _rest: &str) {
        let (notice, command) = match self.mode {
            PowerMode::Shutdown => ("Shutting down, goodbye", "sudo shutdown now"),
            PowerMode::Restart => ("Rebooting", "sudo shutdown -r now"),
        };
        self.speaker.say(notice);
        tracing::info!(command, "Power command");
        if let Err(e) = Command::new("sh").arg("-c").arg(command).status().await {
            tracing::error!(error = %e, command, "Power command failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tts::Speaker;
    use std::sync::{Arc, Mutex};

    struct Recorder(Mutex<Vec<String>>);

    impl Speaker for Recorder {
        fn say(&self, text: &str) {
            self.0.lock().unwrap().push(text.to_string());
        }
    }

    fn recorder() -> Arc<Recorder> {
        Arc::new(Recorder(Mutex::new(vec![])))
    }

    #[test]
    fn volume_modes_parse() {
        assert_eq!(parse_volume_request(""), Some(VolumeRequest::Tell));
        assert_eq!(parse_volume_request("up"), Some(VolumeRequest::Up));
        assert_eq!(parse_volume_request("down"), Some(VolumeRequest::Down));
        assert_eq!(parse_volume_request("max"), Some(VolumeRequest::Max));
        assert_eq!(parse_volume_request("mute"), Some(VolumeRequest::Mute));
        assert_eq!(parse_volume_request("85"), Some(VolumeRequest::Set(85)));
        assert_eq!(parse_volume_request("to 50"), Some(VolumeRequest::Set(50)));
        assert_eq!(parse_volume_request("loud"), None);
    }

    #[test]
    fn volume_clamps_to_percent_range() {
        assert_eq!(clamp_volume(150), 100);
        assert_eq!(clamp_volume(-5), 0);
        assert_eq!(clamp_volume(42), 42);
    }

    #[tokio::test]
    async fn unparseable_volume_asks_for_a_value() {
        let spoken = recorder();
        let control = VolumeControl::new(spoken.clone());
        control.run("loud").await;
        assert_eq!(*spoken.0.lock().unwrap(), vec!["Please specify a value."]);
    }

    #[tokio::test]
    async fn shell_output_is_spoken() {
        let spoken = recorder();
        let action = SpeakShellCommandOutput::new(spoken.clone(), "echo hello there", None);
        action.run("").await;
        assert_eq!(*spoken.0.lock().unwrap(), vec!["hello there"]);
    }

    #[tokio::test]
    async fn empty_output_falls_back_to_failure_text() {
        let spoken = recorder();
        let action =
            SpeakShellCommandOutput::new(spoken.clone(), "true", Some("nothing here".to_string()));
        action.run("").await;
        assert_eq!(*spoken.0.lock().unwrap(), vec!["nothing here"]);
    }

    #[tokio::test]
    async fn empty_output_without_fallback_stays_silent() {
        let spoken = recorder();
        let action = SpeakShellCommandOutput::new(spoken.clone(), "true", None);
        action.run("").await;
        assert!(spoken.0.lock().unwrap().is_empty());
    }
}
