//! Speech-only actions: canned responses, echo, and the spoken clock.

use chrono::{Local, Timelike};

use crate::tts::SharedSpeaker;

/// Says a fixed response for its trigger phrase
pub struct SpeakAction {
    speaker: SharedSpeaker,
    words: String,
}

impl SpeakAction {
    pub fn new(speaker: SharedSpeaker, words: impl Into<String>) -> Self {
        Self {
            speaker,
            words: words.into(),
        }
    }

    pub fn run(&self, _rest: &str) {
        self.speaker.say(&self.words);
    }
}

/// Repeats whatever followed the trigger keyword
pub struct RepeatAfterMe {
    speaker: SharedSpeaker,
}

impl RepeatAfterMe {
    pub fn new(speaker: SharedSpeaker) -> Self {
        Self { speaker }
    }

    pub fn run(&self, rest: &str) {
        self.speaker.say(rest);
    }
}

/// Says the current local time in conversational form
pub struct SpeakTime {
    speaker: SharedSpeaker,
}

impl SpeakTime {
    pub fn new(speaker: SharedSpeaker) -> Self {
        Self { speaker }
    }

    pub fn run(&self, _rest: &str) {
        let now = Local::now();
        self.speaker.say(&time_phrase(now.hour(), now.minute()));
    }
}

const HOURS: [&str; 13] = [
    "midnight", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
    "eleven", "twelve",
];
const MINUTES: [&str; 6] = ["five", "ten", "quarter", "twenty", "twenty-five", "half"];

/// Render a clock reading as speech ("It is twenty past four.").
///
/// Minutes are rounded to the nearest five; past the half hour the phrase
/// inverts to "to" the next hour.
pub fn time_phrase(hour: u32, minute: u32) -> String {
    let mut hour = hour as usize;

    let mut rounded = (minute as usize + 2) / 5;
    let inverted = rounded > 6;
    if inverted {
        rounded = 12 - rounded;
        hour = (hour + 1) % 24;
    }

    if hour > 12 {
        hour -= 12;
    }

    if rounded == 0 {
        if hour == 0 {
            return "It is midnight.".to_string();
        }
        return format!("It is {} o'clock.", HOURS[hour]);
    }

    if inverted {
        format!("It is {} to {}.", MINUTES[rounded - 1], HOURS[hour])
    } else {
        format!("It is {} past {}.", MINUTES[rounded - 1], HOURS[hour])
    }
}
