//! Keyword dispatch: matches a recognized transcript against the trigger
//! table and runs the bound action.
//!
//! The table is a tagged enum built once at startup; handlers receive the
//! transcript with the trigger keyword stripped. First registered keyword
//! contained in the transcript wins.

use std::sync::Arc;

use reqwest::Client;

use crate::actions::lights::ChangeLightColor;
use crate::actions::shell::{PowerCommand, PowerMode, SpeakShellCommandOutput, VolumeControl};
use crate::actions::speak::{RepeatAfterMe, SpeakAction, SpeakTime};
use crate::config::Config;
use crate::hw::{CancelSwitch, HwInterface};
use crate::player::ProcessPlayer;
use crate::resolver::{RadioResolver, VideoResolver};
use crate::session::PlaySessionCoordinator;
use crate::tts::SharedSpeaker;

/// One voice-command handler, resolved at startup
pub enum Action {
    Speak(SpeakAction),
    Time(SpeakTime),
    Repeat(RepeatAfterMe),
    ShellOutput(SpeakShellCommandOutput),
    Volume(VolumeControl),
    Power(PowerCommand),
    Light(ChangeLightColor),
    Play(Arc<PlaySessionCoordinator>),
}

impl Action {
    async fn run(&self, rest: &str) {
        match self {
            Action::Speak(action) => action.run(rest),
            Action::Time(action) => action.run(rest),
            Action::Repeat(action) => action.run(rest),
            Action::ShellOutput(action) => action.run(rest).await,
            Action::Volume(action) => action.run(rest).await,
            Action::Power(action) => action.run(rest).await,
            Action::Light(action) => action.run(rest).await,
            Action::Play(coordinator) => {
                coordinator.run(rest).await;
            }
        }
    }
}

/// Ordered keyword -> action table
#[derive(Default)]
pub struct Dispatcher {
    entries: Vec<(String, Action)>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_keyword(&mut self, keyword: impl Into<String>, action: Action) {
        self.entries.push((keyword.into().to_lowercase(), action));
    }

    /// Run the first action whose keyword occurs in the transcript.
    /// Returns false when nothing matched.
    pub async fn dispatch(&self, transcript: &str) -> bool {
        let text = transcript.to_lowercase();
        for (keyword, action) in &self.entries {
            if text.contains(keyword.as_str()) {
                let rest = text.replacen(keyword.as_str(), "", 1);
                let rest = rest.trim();
                tracing::info!(keyword = %keyword, rest = %rest, "Dispatching");
                action.run(rest).await;
                return true;
            }
        }
        tracing::debug!(transcript = %transcript, "No keyword matched");
        false
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Wire the full trigger table from configuration.
///
/// Both player actions share one external-player handle and the same cancel
/// button; the second binding exercises the registry's append-on-rearm path.
pub fn build_dispatcher(
    config: &Config,
    speaker: SharedSpeaker,
    hw: Arc<HwInterface>,
    http: Client,
) -> Dispatcher {
    let mut dispatcher = Dispatcher::new();

    dispatcher.add_keyword(
        "ip address",
        Action::ShellOutput(SpeakShellCommandOutput::new(
            speaker.clone(),
            "ip -4 route get 1 | head -1 | cut -d' ' -f8",
            Some("I do not have an ip address assigned to me.".to_string()),
        )),
    );

    dispatcher.add_keyword(
        "repeat after me",
        Action::Repeat(RepeatAfterMe::new(speaker.clone())),
    );

    for keyword in ["power off", "turn off"] {
        dispatcher.add_keyword(
            keyword,
            Action::Power(PowerCommand::new(speaker.clone(), PowerMode::Shutdown)),
        );
    }
    for keyword in ["reboot", "restart"] {
        dispatcher.add_keyword(
            keyword,
            Action::Power(PowerCommand::new(speaker.clone(), PowerMode::Restart)),
        );
    }

    dispatcher.add_keyword("volume", Action::Volume(VolumeControl::new(speaker.clone())));

    if let Some(hue) = &config.hue {
        for preset in &hue.presets {
            dispatcher.add_keyword(
                preset.keyword.clone(),
                Action::Light(ChangeLightColor::new(
                    speaker.clone(),
                    http.clone(),
                    hue.bridge.clone(),
                    hue.username.clone(),
                    preset.bulb.clone(),
                    preset.hex_color.clone(),
                )),
            );
        }
    }

    let player = Arc::new(ProcessPlayer::new(config.player.command.clone()));
    let cancel = CancelSwitch::new(hw, config.cancel_channel);

    let video = Arc::new(VideoResolver::new(config.video.ytdlp_bin.clone()));
    dispatcher.add_keyword(
        "play",
        Action::Play(PlaySessionCoordinator::new(
            video,
            player.clone(),
            speaker.clone(),
            Some(&cancel),
        )),
    );

    let radio = Arc::new(RadioResolver::new(http, config.radio.base_url.clone()));
    dispatcher.add_keyword(
        "radio",
        Action::Play(PlaySessionCoordinator::new(
            radio,
            player,
            speaker.clone(),
            Some(&cancel),
        )),
    );

    for canned in &config.responses {
        dispatcher.add_keyword(
            canned.keyword.clone(),
            Action::Speak(SpeakAction::new(speaker.clone(), canned.response.clone())),
        );
    }

    dispatcher.add_keyword("time", Action::Time(SpeakTime::new(speaker)));

    dispatcher
}
