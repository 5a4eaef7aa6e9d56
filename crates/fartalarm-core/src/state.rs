//! The single persisted application structure.
//!
//! Everything the user configures or accumulates lives in one
//! [`AppState`], written back whole on every change. Field names follow
//! the camelCase JSON layout so older payloads keep loading; anything
//! missing takes its default.

use serde::{Deserialize, Serialize};

use crate::alarm::AlarmRegistry;
use crate::engine::RandomFartConfig;
use crate::error::Result;
use crate::fun::FunNotificationState;
use crate::gate::TrialStatus;
use crate::sound::CLASSIC;
use crate::stats::UsageStats;
use crate::timer::{RepeatMode, TimerConfig};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// 0.0 .. 1.0
    pub volume: f32,
    pub dark_mode: bool,
    /// Instant farts and countdowns pick a random built-in sound.
    pub randomize: bool,
    pub repeat_mode: RepeatMode,
    pub random_farts: RandomFartConfig,
    pub notifications_enabled: bool,
    pub fun_notifications: FunNotificationState,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            volume: 1.0,
            dark_mode: true,
            randomize: false,
            repeat_mode: RepeatMode::default(),
            random_farts: RandomFartConfig::default(),
            notifications_enabled: true,
            fun_notifications: FunNotificationState::default(),
        }
    }
}

impl Settings {
    pub fn clamped_volume(&self) -> f32 {
        self.volume.clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppState {
    pub is_premium: bool,
    /// Sound for instant farts: a built-in id or a `custom_` id.
    pub selected_sound: String,
    pub settings: Settings,
    pub timer: TimerConfig,
    pub alarms: AlarmRegistry,
    pub stats: UsageStats,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            is_premium: false,
            selected_sound: CLASSIC.to_string(),
            settings: Settings::default(),
            timer: TimerConfig::default(),
            alarms: AlarmRegistry::new(),
            stats: UsageStats::default(),
        }
    }
}

impl AppState {
    pub fn trial(&self) -> TrialStatus {
        TrialStatus::new(self.is_premium, self.stats.total_farts)
    }

    pub fn trial_ended(&self) -> bool {
        self.trial().trial_ended
    }

    /// Wipe statistics. Premium goes with them.
    pub fn reset_stats(&mut self) {
        self.stats = UsageStats::default();
        self.is_premium = false;
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_payload_loads_defaults() {
        let state = AppState::from_json("{}").unwrap();
        assert_eq!(state, AppState::default());
        assert_eq!(state.settings.volume, 1.0);
        assert!(state.settings.notifications_enabled);
        assert!(state.settings.fun_notifications.enabled);
        assert_eq!(state.timer.total_secs(), 60);
    }

    #[test]
    fn camel_case_layout() {
        let json = serde_json::to_value(AppState::default()).unwrap();
        assert_eq!(json["isPremium"], false);
        assert_eq!(json["selectedSound"], "classic");
        assert!(json["settings"]["randomFarts"]["selectedSounds"].is_array());
        assert_eq!(json["settings"]["repeatMode"]["type"], "times");
        assert!(json["alarms"].is_array());
        assert_eq!(json["stats"]["totalFarts"], 0);
    }

    #[test]
    fn reset_stats_clears_premium() {
        let mut state = AppState {
            is_premium: true,
            ..Default::default()
        };
        state.stats.total_farts = 80;
        state.reset_stats();
        assert!(!state.is_premium);
        assert_eq!(state.stats.total_farts, 0);
        assert!(!state.trial_ended());
    }

    #[test]
    fn json_round_trip_keeps_alarms() {
        let mut state = AppState::default();
        let now = chrono::Local::now().fixed_offset();
        state.alarms.create(&now);
        let back = AppState::from_json(&state.to_json().unwrap()).unwrap();
        assert_eq!(back.alarms.len(), 1);
    }
}
