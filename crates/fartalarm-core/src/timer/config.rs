use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::sound::CLASSIC;

/// Extra plays for [`RepeatKind::Infinite`]; it is not truly endless.
pub const INFINITE_EXTRA_PLAYS: u32 = 50;
/// Pause between repeated completion sounds.
pub const REPEAT_GAP_SECS: i64 = 1;

/// Countdown length and its completion sound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimerConfig {
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
    pub sound: String,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            hours: 0,
            minutes: 1,
            seconds: 0,
            sound: CLASSIC.to_string(),
        }
    }
}

impl TimerConfig {
    pub fn total_secs(&self) -> u64 {
        u64::from(self.hours) * 3600 + u64::from(self.minutes) * 60 + u64::from(self.seconds)
    }

    pub fn total_ms(&self) -> u64 {
        self.total_secs() * 1000
    }

    /// Hours up to 23, minutes and seconds up to 59.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, value, max) in [
            ("hours", self.hours, 23),
            ("minutes", self.minutes, 59),
            ("seconds", self.seconds, 59),
        ] {
            if value > max {
                return Err(ValidationError::OutOfRange {
                    field: field.into(),
                    min: 0,
                    max: max.into(),
                    value: value.into(),
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatKind {
    #[default]
    Times,
    Infinite,
}

/// Replays of the completion sound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepeatMode {
    pub enabled: bool,
    #[serde(rename = "type")]
    pub kind: RepeatKind,
    /// Total plays for [`RepeatKind::Times`], the first one included.
    pub count: u32,
}

impl Default for RepeatMode {
    fn default() -> Self {
        Self {
            enabled: false,
            kind: RepeatKind::Times,
            count: 3,
        }
    }
}

impl RepeatMode {
    /// Plays after the first one.
    pub fn extra_plays(&self) -> u32 {
        if !self.enabled {
            return 0;
        }
        match self.kind {
            RepeatKind::Times if self.count == 0 => 2,
            RepeatKind::Times => self.count - 1,
            RepeatKind::Infinite => INFINITE_EXTRA_PLAYS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn totals() {
        let config = TimerConfig {
            hours: 1,
            minutes: 2,
            seconds: 3,
            ..Default::default()
        };
        assert_eq!(config.total_secs(), 3723);
        assert_eq!(TimerConfig::default().total_secs(), 60);
    }

    #[test]
    fn validate_bounds() {
        assert!(TimerConfig::default().validate().is_ok());
        let config = TimerConfig {
            minutes: 60,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::OutOfRange { value: 60, max: 59, .. })
        ));
        let config = TimerConfig {
            hours: 24,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::OutOfRange { value: 24, max: 23, .. })
        ));
    }

    #[test]
    fn extra_plays() {
        let mut mode = RepeatMode::default();
        assert_eq!(mode.extra_plays(), 0);
        mode.enabled = true;
        assert_eq!(mode.extra_plays(), 2);
        mode.count = 1;
        assert_eq!(mode.extra_plays(), 0);
        mode.count = 0;
        assert_eq!(mode.extra_plays(), 2);
        mode.kind = RepeatKind::Infinite;
        assert_eq!(mode.extra_plays(), 50);
    }

    #[test]
    fn repeat_mode_uses_type_key() {
        let mode: RepeatMode =
            serde_json::from_str(r#"{"enabled":true,"type":"infinite","count":3}"#).unwrap();
        assert_eq!(mode.kind, RepeatKind::Infinite);
    }
}
