//! User-defined alarms.
//!
//! An [`Alarm`] fires at a local `HH:MM`, subject to its [`Repeat`] day
//! filter, and rings sounds picked by its [`SoundMode`] until its duration
//! elapses or the user stops or snoozes it.

pub mod player;
mod registry;

pub use player::{ActiveAlarmPlayer, PlayerCommand, PlayerState, StopReason};
pub use registry::AlarmRegistry;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::scheduler::{hhmm, Timestamp};
use crate::sound::CLASSIC;

pub const MIN_DURATION_SECS: u32 = 10;
pub const MAX_DURATION_SECS: u32 = 600;
pub const MAX_GAP_SECS: u32 = 5;
pub const DEFAULT_DURATION_SECS: u32 = 120;
pub const DEFAULT_GAP_SECS: u32 = 1;
pub const DEFAULT_ALARM_NAME: &str = "New Fart Alarm";

/// Day filter applied on top of the time match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Repeat {
    /// Fires once, then disables itself.
    #[default]
    Once,
    Daily,
    /// Monday to Friday.
    Weekdays,
    /// Saturday and Sunday.
    Weekends,
}

impl Repeat {
    /// Whether the alarm may fire on `day` (0 = Sunday .. 6 = Saturday).
    pub fn allows_day(self, day: u32) -> bool {
        match self {
            Repeat::Once | Repeat::Daily => true,
            Repeat::Weekdays => (1..=5).contains(&day),
            Repeat::Weekends => day == 0 || day == 6,
        }
    }
}

/// How the ringing loop picks its next sound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoundMode {
    /// Always [`Alarm::sound`].
    Specific,
    /// Round-robin through [`Alarm::selected_sounds`].
    Selected,
    /// Uniform over the whole catalog, built-in and custom.
    #[default]
    Random,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alarm {
    pub id: String,
    pub name: String,
    /// Local wall-clock `HH:MM`.
    pub time: String,
    #[serde(default)]
    pub repeat: Repeat,
    #[serde(default)]
    pub sound_mode: SoundMode,
    #[serde(default = "default_sound")]
    pub sound: String,
    #[serde(default = "default_selected_sounds")]
    pub selected_sounds: Vec<String>,
    /// Ring duration in seconds.
    #[serde(default = "default_duration")]
    pub duration: u32,
    /// Pause between consecutive sounds, in seconds.
    #[serde(default = "default_gap")]
    pub gap_between_sounds: u32,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Day (`YYYY-MM-DD`) of the last normal firing. Snoozes don't touch it.
    #[serde(default)]
    pub last_triggered: Option<String>,
}

fn default_sound() -> String {
    CLASSIC.to_string()
}
fn default_selected_sounds() -> Vec<String> {
    vec![CLASSIC.to_string()]
}
fn default_duration() -> u32 {
    DEFAULT_DURATION_SECS
}
fn default_gap() -> u32 {
    DEFAULT_GAP_SECS
}
fn default_true() -> bool {
    true
}

impl Alarm {
    /// A new enabled alarm set to the current minute.
    pub fn new(now: &Timestamp) -> Self {
        Self {
            id: format!("alarm_{}", Uuid::new_v4().simple()),
            name: DEFAULT_ALARM_NAME.to_string(),
            time: hhmm(now),
            repeat: Repeat::Once,
            sound_mode: SoundMode::Random,
            sound: default_sound(),
            selected_sounds: default_selected_sounds(),
            duration: DEFAULT_DURATION_SECS,
            gap_between_sounds: DEFAULT_GAP_SECS,
            enabled: true,
            last_triggered: None,
        }
    }
}

/// Field-level edit of an alarm. `None` leaves the field alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AlarmPatch {
    pub name: Option<String>,
    pub time: Option<String>,
    pub repeat: Option<Repeat>,
    pub sound_mode: Option<SoundMode>,
    pub sound: Option<String>,
    pub selected_sounds: Option<Vec<String>>,
    pub duration: Option<u32>,
    pub gap_between_sounds: Option<u32>,
    pub enabled: Option<bool>,
}

impl AlarmPatch {
    /// Apply in place.
    ///
    /// Durations and gaps are clamped into range. A malformed time or an
    /// empty sound selection is not applied; the rest of the patch is.
    pub fn apply_to(&self, alarm: &mut Alarm) {
        if let Some(name) = &self.name {
            alarm.name = name.clone();
        }
        if let Some(time) = &self.time {
            match parse_time(time) {
                Ok(_) => alarm.time = time.clone(),
                Err(e) => tracing::warn!(alarm = %alarm.id, error = %e, "time not applied"),
            }
        }
        if let Some(repeat) = self.repeat {
            alarm.repeat = repeat;
        }
        if let Some(mode) = self.sound_mode {
            alarm.sound_mode = mode;
        }
        if let Some(sound) = &self.sound {
            alarm.sound = sound.clone();
        }
        if let Some(selected) = &self.selected_sounds {
            if selected.is_empty() {
                tracing::warn!(alarm = %alarm.id, "refusing to empty selected sounds");
            } else {
                alarm.selected_sounds = dedup(selected);
            }
        }
        if let Some(duration) = self.duration {
            alarm.duration = duration.clamp(MIN_DURATION_SECS, MAX_DURATION_SECS);
        }
        if let Some(gap) = self.gap_between_sounds {
            alarm.gap_between_sounds = gap.min(MAX_GAP_SECS);
        }
        if let Some(enabled) = self.enabled {
            alarm.enabled = enabled;
        }
    }

    /// Strict check for hosts that want to report bad input instead of
    /// silently clamping.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(time) = &self.time {
            parse_time(time)?;
        }
        if let Some(duration) = self.duration {
            check_range("duration", duration, MIN_DURATION_SECS, MAX_DURATION_SECS)?;
        }
        if let Some(gap) = self.gap_between_sounds {
            check_range("gapBetweenSounds", gap, 0, MAX_GAP_SECS)?;
        }
        if matches!(&self.selected_sounds, Some(s) if s.is_empty()) {
            return Err(ValidationError::InvalidValue {
                field: "selectedSounds".into(),
                message: "at least one sound must stay selected".into(),
            });
        }
        Ok(())
    }
}

fn check_range(field: &str, value: u32, min: u32, max: u32) -> Result<(), ValidationError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange {
            field: field.into(),
            min: min.into(),
            max: max.into(),
            value: value.into(),
        })
    }
}

/// Keep first occurrences, preserving order.
fn dedup(sounds: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(sounds.len());
    for sound in sounds {
        if !out.contains(sound) {
            out.push(sound.clone());
        }
    }
    out
}

/// Parse a zero-padded `HH:MM` into `(hour, minute)`.
pub fn parse_time(s: &str) -> Result<(u32, u32), ValidationError> {
    let invalid = || ValidationError::InvalidTime(s.to_string());
    let (h, m) = s.split_once(':').ok_or_else(invalid)?;
    if h.len() != 2 || m.len() != 2 {
        return Err(invalid());
    }
    let hour: u32 = h.parse().map_err(|_| invalid())?;
    let minute: u32 = m.parse().map_err(|_| invalid())?;
    if hour > 23 || minute > 59 {
        return Err(invalid());
    }
    Ok((hour, minute))
}
