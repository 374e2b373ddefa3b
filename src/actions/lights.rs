//! Smart-light color action for a Philips-Hue-style bridge.
//!
//! The bridge API wants CIE xy coordinates, so the configured hex RGB color
//! goes through gamma correction and the wide-gamut D65 matrix first.

use std::collections::HashMap;

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::tts::SharedSpeaker;

const BRIDGE_NOTICE: &str = "No bridge registered, press the button on the bridge and try again";

/// Convert a 6-digit hex RGB color to CIE xy chromaticity coordinates.
pub fn hex_to_xy(hex: &str) -> Result<(f64, f64), String> {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(format!("not a hex color: {hex:?}"));
    }
    let channel = |range: std::ops::Range<usize>| -> f64 {
        u8::from_str_radix(&hex[range], 16).unwrap_or(0) as f64 / 255.0
    };
    let gamma = |c: f64| -> f64 {
        if c > 0.04045 {
            ((c + 0.055) / 1.055).powf(2.4)
        } else {
            c / 12.92
        }
    };

    let r = gamma(channel(0..2));
    let g = gamma(channel(2..4));
    let b = gamma(channel(4..6));

    let x = r * 0.664511 + g * 0.154324 + b * 0.162028;
    let y = r * 0.283881 + g * 0.668433 + b * 0.047685;
    let z = r * 0.000088 + g * 0.072310 + b * 0.986039;

    let sum = x + y + z;
    if sum == 0.0 {
        // Black carries no chromaticity; fall back to the D65 white point
        return Ok((0.3127, 0.3290));
    }
    Ok((x / sum, y / sum))
}

#[derive(Debug, Deserialize)]
struct LightInfo {
    name: String,
}

/// Turns a named bulb on and sets it to a preset color
pub struct ChangeLightColor {
    speaker: SharedSpeaker,
    client: Client,
    bridge: String,
    username: String,
    bulb: String,
    hex_color: String,
}

impl ChangeLightColor {
    pub fn new(
        speaker: SharedSpeaker,
        client: Client,
        bridge: impl Into<String>,
        username: impl Into<String>,
        bulb: impl Into<String>,
        hex_color: impl Into<String>,
    ) -> Self {
        Self {
            speaker,
            client,
            bridge: bridge.into(),
            username: username.into(),
            bulb: bulb.into(),
            hex_color: hex_color.into(),
        }
    }

    pub async fn run(&self, _rest: &str) {
        match self.apply().await {
            Ok(()) => self.speaker.say("Ok"),
            Err(e) => {
                tracing::warn!(error = %e, bulb = %self.bulb, "Light command failed");
                self.speaker.say(BRIDGE_NOTICE);
            }
        }
    }

    async fn apply(&self) -> anyhow::Result<()> {
        let (x, y) = hex_to_xy(&self.hex_color).map_err(anyhow::Error::msg)?;

        let lights_url = format!("http://{}/api/{}/lights", self.bridge, self.username);
        let lights: HashMap<String, LightInfo> = self
            .client
            .get(&lights_url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let id = lights
            .iter()
            .find(|(_, info)| info.name == self.bulb)
            .map(|(id, _)| id.clone())
            .ok_or_else(|| anyhow::anyhow!("no light named {:?} on bridge", self.bulb))?;

        let state_url = format!("{lights_url}/{id}/state");
        self.client
            .put(&state_url)
            .json(&json!({ "on": true, "xy": [x, y] }))
            .send()
            .await?
            .error_for_status()?;

        tracing::info!(bulb = %self.bulb, x, y, "Light color set");
        Ok(())
    }
}
