//! Random-fart scheduler.
//!
//! A self-perpetuating one-shot: every firing, played or skipped, arms
//! the next one at a freshly drawn whole-minute offset. Changing a
//! governing setting cancels the pending shot and starts over.

use chrono::Duration;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::Effect;
use crate::alarm::parse_time;
use crate::events::Event;
use crate::notify::Notification;
use crate::scheduler::{floor_minute, hhmm, Timestamp};
use crate::sound::catalog::built_in_ids;
use crate::sound::CLASSIC;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RandomSoundMode {
    #[default]
    Random,
    Specific,
}

/// Why a due random fart did not play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    TrialEnded,
    OutsideActiveHours,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RandomFartConfig {
    pub enabled: bool,
    /// Minutes.
    pub min_interval: u32,
    /// Minutes.
    pub max_interval: u32,
    /// Epoch millis of the pending shot. Display only; never re-armed from.
    pub next_scheduled_time: Option<i64>,
    pub show_notifications: bool,
    pub active_hours_enabled: bool,
    pub active_hours_start: String,
    pub active_hours_end: String,
    pub sound_mode: RandomSoundMode,
    pub selected_sounds: Vec<String>,
}

impl Default for RandomFartConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            min_interval: 30,
            max_interval: 120,
            next_scheduled_time: None,
            show_notifications: true,
            active_hours_enabled: false,
            active_hours_start: "09:00".to_string(),
            active_hours_end: "17:00".to_string(),
            sound_mode: RandomSoundMode::Random,
            selected_sounds: built_in_ids(),
        }
    }
}

impl RandomFartConfig {
    /// `(min, max)` with both at least one and `min <= max`, whatever was
    /// loaded from storage.
    pub fn interval_bounds(&self) -> (u32, u32) {
        let min = self.min_interval.max(1);
        (min, self.max_interval.max(min))
    }

    /// Merge a patch. Returns whether a field that governs the pending
    /// schedule changed (`enabled`, intervals or sound selection).
    pub fn apply(&mut self, patch: &RandomFartPatch) -> bool {
        let before = (
            self.enabled,
            self.min_interval,
            self.max_interval,
            self.selected_sounds.clone(),
        );

        if let Some(enabled) = patch.enabled {
            self.enabled = enabled;
        }
        if let Some(min) = patch.min_interval {
            self.min_interval = min.max(1);
        }
        if let Some(max) = patch.max_interval {
            self.max_interval = max.max(1);
        }
        if self.max_interval < self.min_interval {
            self.max_interval = self.min_interval;
        }
        if let Some(show) = patch.show_notifications {
            self.show_notifications = show;
        }
        if let Some(on) = patch.active_hours_enabled {
            self.active_hours_enabled = on;
        }
        if let Some(start) = &patch.active_hours_start {
            match parse_time(start) {
                Ok(_) => self.active_hours_start = start.clone(),
                Err(e) => tracing::warn!(error = %e, "active hours start not applied"),
            }
        }
        if let Some(end) = &patch.active_hours_end {
            match parse_time(end) {
                Ok(_) => self.active_hours_end = end.clone(),
                Err(e) => tracing::warn!(error = %e, "active hours end not applied"),
            }
        }
        if let Some(mode) = patch.sound_mode {
            self.sound_mode = mode;
        }
        if let Some(selected) = &patch.selected_sounds {
            if selected.is_empty() {
                tracing::warn!("refusing to empty random-fart sound selection");
            } else {
                let mut deduped: Vec<String> = Vec::with_capacity(selected.len());
                for sound in selected {
                    if !deduped.contains(sound) {
                        deduped.push(sound.clone());
                    }
                }
                self.selected_sounds = deduped;
            }
        }

        before
            != (
                self.enabled,
                self.min_interval,
                self.max_interval,
                self.selected_sounds.clone(),
            )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RandomFartPatch {
    pub enabled: Option<bool>,
    pub min_interval: Option<u32>,
    pub max_interval: Option<u32>,
    pub show_notifications: Option<bool>,
    pub active_hours_enabled: Option<bool>,
    pub active_hours_start: Option<String>,
    pub active_hours_end: Option<String>,
    pub sound_mode: Option<RandomSoundMode>,
    pub selected_sounds: Option<Vec<String>>,
}

impl RandomFartPatch {
    pub fn select_all(ids: Vec<String>) -> Self {
        Self {
            selected_sounds: Some(ids),
            ..Self::default()
        }
    }

    /// "None" still keeps classic.
    pub fn select_none() -> Self {
        Self {
            selected_sounds: Some(vec![CLASSIC.to_string()]),
            ..Self::default()
        }
    }

    /// Flip one sound in the selection. `None` when that would empty it.
    pub fn toggle_sound(config: &RandomFartConfig, id: &str) -> Option<Self> {
        let mut selected = config.selected_sounds.clone();
        match selected.iter().position(|s| s == id) {
            Some(index) => {
                selected.remove(index);
            }
            None => selected.push(id.to_string()),
        }
        (!selected.is_empty()).then(|| Self {
            selected_sounds: Some(selected),
            ..Self::default()
        })
    }
}

/// Uniform integer in `[min, max]`, both inclusive.
pub fn draw_delay_minutes<R: Rng + ?Sized>(config: &RandomFartConfig, rng: &mut R) -> u32 {
    let (min, max) = config.interval_bounds();
    rng.gen_range(min..=max)
}

/// `now` truncated to the minute, plus `minutes`.
pub fn next_fire_at(now: &Timestamp, minutes: u32) -> Timestamp {
    floor_minute(now) + Duration::minutes(i64::from(minutes))
}

/// Whether `now` falls inside `[start, end)`.
///
/// Compares zero-padded `HH:MM` strings, so a range that wraps past
/// midnight (`22:00`..`06:00`) never matches.
pub fn in_active_hours(config: &RandomFartConfig, now: &Timestamp) -> bool {
    let current = hhmm(now);
    current.as_str() >= config.active_hours_start.as_str()
        && current.as_str() < config.active_hours_end.as_str()
}

/// Uniform pick from the selection, classic when it is empty.
pub fn pick_sound<R: Rng + ?Sized>(config: &RandomFartConfig, rng: &mut R) -> String {
    config
        .selected_sounds
        .choose(rng)
        .cloned()
        .unwrap_or_else(|| CLASSIC.to_string())
}

/// (Re)configure: cancel whatever is pending and arm a fresh shot when
/// the feature is on and the trial allows it.
pub fn configure_random_fart<R: Rng + ?Sized>(
    config: &mut RandomFartConfig,
    trial_ended: bool,
    now: &Timestamp,
    rng: &mut R,
) -> Vec<Effect> {
    let mut effects = vec![Effect::CancelRandomFart];
    if !config.enabled || trial_ended {
        if trial_ended && config.enabled {
            tracing::info!("trial ended, random farts not armed");
        }
        if config.next_scheduled_time.take().is_some() {
            effects.push(Effect::Persist);
        }
        return effects;
    }
    effects.extend(arm(config, now, rng));
    effects
}

/// The pending shot came due.
///
/// Skips silently when the trial has ended since arming or when outside
/// active hours; re-arms either way.
pub fn fire_random_fart<R: Rng + ?Sized>(
    config: &mut RandomFartConfig,
    trial_ended: bool,
    notifications_enabled: bool,
    now: &Timestamp,
    rng: &mut R,
) -> Vec<Effect> {
    if !config.enabled {
        return Vec::new();
    }

    let skip = if trial_ended {
        Some(SkipReason::TrialEnded)
    } else if config.active_hours_enabled && !in_active_hours(config, now) {
        Some(SkipReason::OutsideActiveHours)
    } else {
        None
    };

    let mut effects = Vec::new();
    match skip {
        Some(reason) => {
            tracing::debug!(?reason, "random fart skipped");
            effects.push(Effect::Emit(Event::RandomFartSkipped { reason, at: *now }));
        }
        None => {
            if config.show_notifications && notifications_enabled {
                effects.push(Effect::Notify(Notification::random_fart()));
            }
            effects.push(Effect::PlaySound(pick_sound(config, rng)));
        }
    }
    effects.extend(arm(config, now, rng));
    effects
}

fn arm<R: Rng + ?Sized>(config: &mut RandomFartConfig, now: &Timestamp, rng: &mut R) -> Vec<Effect> {
    let delay_minutes = draw_delay_minutes(config, rng);
    let at = next_fire_at(now, delay_minutes);
    config.next_scheduled_time = Some(at.timestamp_millis());
    tracing::debug!(delay_minutes, next = %at, "random fart armed");
    vec![
        Effect::ArmRandomFart { at },
        Effect::Persist,
        Effect::Emit(Event::RandomFartScheduled {
            next_at: at,
            delay_minutes,
            at: *now,
        }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone, Timelike};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn at(h: u32, m: u32, s: u32) -> Timestamp {
        FixedOffset::east_opt(-4 * 3600)
            .unwrap()
            .with_ymd_and_hms(2026, 10, 12, h, m, s)
            .unwrap()
    }

    fn enabled() -> RandomFartConfig {
        RandomFartConfig {
            enabled: true,
            min_interval: 5,
            max_interval: 10,
            ..Default::default()
        }
    }

    fn armed_at(effects: &[Effect]) -> Option<Timestamp> {
        effects.iter().find_map(|e| match e {
            Effect::ArmRandomFart { at } => Some(*at),
            _ => None,
        })
    }

    #[test]
    fn defaults_select_every_built_in() {
        let config = RandomFartConfig::default();
        assert!(!config.enabled);
        assert_eq!(config.interval_bounds(), (30, 120));
        assert_eq!(config.selected_sounds.len(), 6);
    }

    #[test]
    fn configure_arms_on_a_whole_minute() {
        let mut config = enabled();
        let mut rng = StdRng::seed_from_u64(4);
        let now = at(10, 15, 42);
        let effects = configure_random_fart(&mut config, false, &now, &mut rng);

        assert_eq!(effects[0], Effect::CancelRandomFart);
        let target = armed_at(&effects).unwrap();
        assert_eq!(target.second(), 0);
        let minutes = (target - floor_minute(&now)).num_minutes();
        assert!((5..=10).contains(&minutes));
        assert_eq!(config.next_scheduled_time, Some(target.timestamp_millis()));
    }

    #[test]
    fn configure_when_disabled_or_trial_over_only_cancels() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut config = RandomFartConfig::default();
        let effects = configure_random_fart(&mut config, false, &at(10, 0, 0), &mut rng);
        assert_eq!(effects, vec![Effect::CancelRandomFart]);

        let mut config = enabled();
        config.next_scheduled_time = Some(1);
        let effects = configure_random_fart(&mut config, true, &at(10, 0, 0), &mut rng);
        assert_eq!(effects, vec![Effect::CancelRandomFart, Effect::Persist]);
        assert!(config.next_scheduled_time.is_none());
    }

    #[test]
    fn firing_plays_from_selection_and_rearms() {
        let mut config = enabled();
        config.selected_sounds = vec!["wet".into()];
        let mut rng = StdRng::seed_from_u64(4);
        let effects = fire_random_fart(&mut config, false, true, &at(12, 0, 0), &mut rng);

        assert!(effects.contains(&Effect::PlaySound("wet".into())));
        assert!(effects.contains(&Effect::Notify(Notification::random_fart())));
        assert!(armed_at(&effects).is_some());
    }

    #[test]
    fn notification_needs_both_switches() {
        let mut config = enabled();
        config.show_notifications = false;
        let mut rng = StdRng::seed_from_u64(4);
        let effects = fire_random_fart(&mut config, false, true, &at(12, 0, 0), &mut rng);
        assert!(!effects.iter().any(|e| matches!(e, Effect::Notify(_))));

        let mut config = enabled();
        let effects = fire_random_fart(&mut config, false, false, &at(12, 0, 0), &mut rng);
        assert!(!effects.iter().any(|e| matches!(e, Effect::Notify(_))));
    }

    #[test]
    fn trial_end_skips_but_rearms() {
        let mut config = enabled();
        let mut rng = StdRng::seed_from_u64(4);
        let effects = fire_random_fart(&mut config, true, true, &at(12, 0, 0), &mut rng);
        assert!(!effects.iter().any(|e| matches!(e, Effect::PlaySound(_))));
        assert!(effects.iter().any(|e| matches!(
            e,
            Effect::Emit(Event::RandomFartSkipped { reason: SkipReason::TrialEnded, .. })
        )));
        assert!(armed_at(&effects).is_some());
    }

    #[test]
    fn active_hours_are_half_open() {
        let config = RandomFartConfig {
            active_hours_enabled: true,
            ..enabled()
        };
        assert!(!in_active_hours(&config, &at(8, 59, 59)));
        assert!(in_active_hours(&config, &at(9, 0, 0)));
        assert!(in_active_hours(&config, &at(16, 59, 0)));
        assert!(!in_active_hours(&config, &at(17, 0, 0)));
    }

    #[test]
    fn overnight_range_never_matches() {
        let config = RandomFartConfig {
            active_hours_enabled: true,
            active_hours_start: "22:00".into(),
            active_hours_end: "06:00".into(),
            ..enabled()
        };
        assert!(!in_active_hours(&config, &at(23, 0, 0)));
        assert!(!in_active_hours(&config, &at(3, 0, 0)));
    }

    #[test]
    fn outside_active_hours_skips() {
        let mut config = RandomFartConfig {
            active_hours_enabled: true,
            ..enabled()
        };
        let mut rng = StdRng::seed_from_u64(4);
        let effects = fire_random_fart(&mut config, false, true, &at(20, 0, 0), &mut rng);
        assert!(!effects.iter().any(|e| matches!(e, Effect::PlaySound(_))));
        assert!(armed_at(&effects).is_some());
    }

    #[test]
    fn patch_clamps_intervals_and_reports_governing_changes() {
        let mut config = enabled();
        assert!(config.apply(&RandomFartPatch {
            min_interval: Some(0),
            max_interval: Some(0),
            ..Default::default()
        }));
        assert_eq!((config.min_interval, config.max_interval), (1, 1));

        assert!(config.apply(&RandomFartPatch {
            min_interval: Some(40),
            ..Default::default()
        }));
        assert_eq!((config.min_interval, config.max_interval), (40, 40));

        assert!(!config.apply(&RandomFartPatch {
            show_notifications: Some(false),
            active_hours_start: Some("10:00".into()),
            ..Default::default()
        }));
        assert_eq!(config.active_hours_start, "10:00");

        assert!(!config.apply(&RandomFartPatch {
            active_hours_end: Some("25:00".into()),
            selected_sounds: Some(vec![]),
            ..Default::default()
        }));
        assert_eq!(config.active_hours_end, "17:00");
        assert_eq!(config.selected_sounds.len(), 6);
    }

    #[test]
    fn selection_helpers() {
        let mut config = enabled();
        assert!(config.apply(&RandomFartPatch::select_none()));
        assert_eq!(config.selected_sounds, vec!["classic".to_string()]);
        assert!(RandomFartPatch::toggle_sound(&config, "classic").is_none());

        let patch = RandomFartPatch::toggle_sound(&config, "custom_x").unwrap();
        config.apply(&patch);
        assert_eq!(config.selected_sounds, vec!["classic".to_string(), "custom_x".to_string()]);

        config.apply(&RandomFartPatch::select_all(built_in_ids()));
        assert_eq!(config.selected_sounds.len(), 6);
    }

    #[test]
    fn legacy_config_loads_with_defaults() {
        let config: RandomFartConfig =
            serde_json::from_str(r#"{"enabled":true,"minInterval":15}"#).unwrap();
        assert_eq!(config.min_interval, 15);
        assert_eq!(config.max_interval, 120);
        assert_eq!(config.active_hours_start, "09:00");
    }
}
