//! Ringing-alarm state machine.
//!
//! ## State Transitions
//!
//! ```text
//! Starting -> Looping -> Stopped
//!     |          ^
//!     v          |
//!  Blocked ------+   (explicit user interaction)
//! ```
//!
//! The player never waits by itself. Each step returns a [`PlayerCommand`]
//! and the host reports back: `on_played` once a sound has finished,
//! `resume` once a requested wait has elapsed.

use chrono::Duration;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{Alarm, SoundMode};
use crate::scheduler::Timestamp;
use crate::sound::catalog::built_in_ids;
use crate::sound::CLASSIC;

/// Minimum pause after a failed play, so a broken sound cannot spin.
const RETRY_AFTER_FAILURE_SECS: i64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerState {
    /// Playing the probe sound that detects an autoplay block.
    Starting,
    Looping,
    /// Audio is blocked until the user interacts.
    Blocked,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StopReason {
    /// Rang for its full duration.
    DurationElapsed,
    /// Stop pressed.
    User,
    Snoozed { minutes: u32 },
}

/// What the host should do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerCommand {
    /// Play this sound id, then call `on_played` with its duration.
    Play(String),
    /// Call `resume` after this long.
    Wait(Duration),
    /// The alarm is over; clear it.
    Finish(StopReason),
    /// Nothing to do until `retry`.
    AwaitInteraction,
}

#[derive(Debug, Clone)]
pub struct ActiveAlarmPlayer {
    alarm: Alarm,
    snoozed: bool,
    state: PlayerState,
    started_at: Timestamp,
    pool: Vec<String>,
    next_index: usize,
    current_sound: Option<String>,
    stop_reason: Option<StopReason>,
}

impl ActiveAlarmPlayer {
    /// Prepare a player for `alarm`. `custom_ids` extends the pool in
    /// [`SoundMode::Random`].
    pub fn new(alarm: Alarm, snoozed: bool, custom_ids: &[String], now: Timestamp) -> Self {
        let pool = match alarm.sound_mode {
            SoundMode::Specific if alarm.sound.is_empty() => vec![CLASSIC.to_string()],
            SoundMode::Specific => vec![alarm.sound.clone()],
            SoundMode::Random => {
                let mut ids = built_in_ids();
                ids.extend(custom_ids.iter().cloned());
                ids
            }
            SoundMode::Selected if alarm.selected_sounds.is_empty() => vec![CLASSIC.to_string()],
            SoundMode::Selected => alarm.selected_sounds.clone(),
        };
        Self {
            alarm,
            snoozed,
            state: PlayerState::Starting,
            started_at: now,
            pool,
            next_index: 0,
            current_sound: None,
            stop_reason: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn alarm(&self) -> &Alarm {
        &self.alarm
    }

    pub fn alarm_id(&self) -> &str {
        &self.alarm.id
    }

    /// Activated by an expired snooze rather than its time match.
    pub fn is_snoozed(&self) -> bool {
        self.snoozed
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn started_at(&self) -> Timestamp {
        self.started_at
    }

    pub fn current_sound(&self) -> Option<&str> {
        self.current_sound.as_deref()
    }

    pub fn pool(&self) -> &[String] {
        &self.pool
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop_reason
    }

    /// Wall-clock time since activation, never negative.
    pub fn elapsed(&self, now: &Timestamp) -> Duration {
        (*now - self.started_at).max(Duration::zero())
    }

    pub fn remaining_secs(&self, now: &Timestamp) -> i64 {
        (i64::from(self.alarm.duration) - self.elapsed(now).num_seconds()).max(0)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin with the probe sound.
    pub fn start(&mut self) -> PlayerCommand {
        self.state = PlayerState::Starting;
        self.current_sound = Some(CLASSIC.to_string());
        PlayerCommand::Play(CLASSIC.to_string())
    }

    /// Report that the last requested sound finished. `duration_secs` is
    /// what the gateway returned; zero means the play failed.
    pub fn on_played<R: Rng + ?Sized>(
        &mut self,
        duration_secs: f64,
        now: &Timestamp,
        rng: &mut R,
    ) -> PlayerCommand {
        if let Some(reason) = self.stop_reason {
            return PlayerCommand::Finish(reason);
        }
        match self.state {
            PlayerState::Starting if duration_secs <= 0.0 => {
                tracing::info!(alarm = %self.alarm.id, "audio blocked, waiting for interaction");
                self.state = PlayerState::Blocked;
                PlayerCommand::AwaitInteraction
            }
            PlayerState::Starting => {
                self.state = PlayerState::Looping;
                self.advance(now, rng)
            }
            PlayerState::Looping => {
                let gap = i64::from(self.alarm.gap_between_sounds);
                if duration_secs <= 0.0 {
                    tracing::warn!(
                        alarm = %self.alarm.id,
                        sound = self.current_sound.as_deref().unwrap_or_default(),
                        "alarm sound failed to play"
                    );
                    PlayerCommand::Wait(Duration::seconds(gap.max(RETRY_AFTER_FAILURE_SECS)))
                } else if gap > 0 {
                    PlayerCommand::Wait(Duration::seconds(gap))
                } else {
                    self.advance(now, rng)
                }
            }
            PlayerState::Blocked => PlayerCommand::AwaitInteraction,
            PlayerState::Stopped => PlayerCommand::Finish(StopReason::User),
        }
    }

    /// Continue after a `Wait`.
    pub fn resume<R: Rng + ?Sized>(&mut self, now: &Timestamp, rng: &mut R) -> PlayerCommand {
        if let Some(reason) = self.stop_reason {
            return PlayerCommand::Finish(reason);
        }
        match self.state {
            PlayerState::Looping => self.advance(now, rng),
            PlayerState::Blocked => PlayerCommand::AwaitInteraction,
            PlayerState::Starting => self.start(),
            PlayerState::Stopped => PlayerCommand::Finish(StopReason::User),
        }
    }

    /// User interaction while blocked: probe again.
    pub fn retry(&mut self) -> Option<PlayerCommand> {
        (self.state == PlayerState::Blocked).then(|| self.start())
    }

    /// Cooperative stop: consulted at the next step boundary. The sound
    /// in flight is the host's to halt.
    pub fn request_stop(&mut self, reason: StopReason) {
        if self.state != PlayerState::Stopped {
            self.state = PlayerState::Stopped;
            self.stop_reason = Some(reason);
        }
    }

    /// Next sound per the alarm's mode. Round-robin for `selected`.
    pub fn next_sound<R: Rng + ?Sized>(&mut self, rng: &mut R) -> String {
        match self.alarm.sound_mode {
            SoundMode::Random => self
                .pool
                .choose(rng)
                .cloned()
                .unwrap_or_else(|| CLASSIC.to_string()),
            SoundMode::Specific | SoundMode::Selected => {
                let sound = self.pool[self.next_index % self.pool.len()].clone();
                self.next_index = (self.next_index + 1) % self.pool.len();
                sound
            }
        }
    }

    fn advance<R: Rng + ?Sized>(&mut self, now: &Timestamp, rng: &mut R) -> PlayerCommand {
        if self.elapsed(now).num_seconds() >= i64::from(self.alarm.duration) {
            tracing::info!(alarm = %self.alarm.id, "alarm duration completed");
            self.request_stop(StopReason::DurationElapsed);
            return PlayerCommand::Finish(StopReason::DurationElapsed);
        }
        let sound = self.next_sound(rng);
        self.current_sound = Some(sound.clone());
        PlayerCommand::Play(sound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn t0() -> Timestamp {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2026, 10, 12, 7, 0, 0)
            .unwrap()
    }

    fn alarm(mode: SoundMode) -> Alarm {
        let mut a = Alarm::new(&t0());
        a.sound_mode = mode;
        a.sound = "thunder".into();
        a.selected_sounds = vec!["wet".into(), "long".into(), "squeaky".into()];
        a.duration = 30;
        a.gap_between_sounds = 2;
        a
    }

    #[test]
    fn probe_then_loop() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut p = ActiveAlarmPlayer::new(alarm(SoundMode::Specific), false, &[], t0());
        assert_eq!(p.start(), PlayerCommand::Play("classic".into()));
        assert_eq!(p.state(), PlayerState::Starting);

        let now = t0() + Duration::seconds(2);
        assert_eq!(p.on_played(2.0, &now, &mut rng), PlayerCommand::Play("thunder".into()));
        assert_eq!(p.state(), PlayerState::Looping);
        assert_eq!(
            p.on_played(2.0, &now, &mut rng),
            PlayerCommand::Wait(Duration::seconds(2))
        );
        assert_eq!(p.resume(&now, &mut rng), PlayerCommand::Play("thunder".into()));
    }

    #[test]
    fn failed_probe_blocks_until_retry() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut p = ActiveAlarmPlayer::new(alarm(SoundMode::Specific), false, &[], t0());
        p.start();
        assert_eq!(p.on_played(0.0, &t0(), &mut rng), PlayerCommand::AwaitInteraction);
        assert_eq!(p.state(), PlayerState::Blocked);
        assert_eq!(p.resume(&t0(), &mut rng), PlayerCommand::AwaitInteraction);

        assert_eq!(p.retry(), Some(PlayerCommand::Play("classic".into())));
        assert_eq!(p.state(), PlayerState::Starting);
        assert_eq!(p.retry(), None);
    }

    #[test]
    fn selected_mode_round_robins() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut p = ActiveAlarmPlayer::new(alarm(SoundMode::Selected), false, &[], t0());
        let picks: Vec<_> = (0..5).map(|_| p.next_sound(&mut rng)).collect();
        assert_eq!(picks, vec!["wet", "long", "squeaky", "wet", "long"]);
    }

    #[test]
    fn random_mode_draws_from_catalog_and_custom() {
        let mut rng = StdRng::seed_from_u64(11);
        let custom = vec!["custom_abc".to_string()];
        let mut p = ActiveAlarmPlayer::new(alarm(SoundMode::Random), false, &custom, t0());
        assert_eq!(p.pool().len(), 7);
        for _ in 0..100 {
            let sound = p.next_sound(&mut rng);
            assert!(p.pool().contains(&sound));
        }
    }

    #[test]
    fn stops_once_duration_elapsed() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut p = ActiveAlarmPlayer::new(alarm(SoundMode::Specific), false, &[], t0());
        p.start();
        p.on_played(2.0, &t0(), &mut rng);

        let late = t0() + Duration::seconds(30);
        assert_eq!(
            p.resume(&late, &mut rng),
            PlayerCommand::Finish(StopReason::DurationElapsed)
        );
        assert_eq!(p.state(), PlayerState::Stopped);
        assert_eq!(p.remaining_secs(&late), 0);
    }

    #[test]
    fn stop_request_skips_the_gap() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut p = ActiveAlarmPlayer::new(alarm(SoundMode::Specific), false, &[], t0());
        p.start();
        p.on_played(2.0, &t0(), &mut rng);
        p.request_stop(StopReason::Snoozed { minutes: 5 });
        assert_eq!(
            p.on_played(2.0, &t0(), &mut rng),
            PlayerCommand::Finish(StopReason::Snoozed { minutes: 5 })
        );
    }

    #[test]
    fn failed_loop_play_waits_before_retrying() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut a = alarm(SoundMode::Specific);
        a.gap_between_sounds = 0;
        let mut p = ActiveAlarmPlayer::new(a, false, &[], t0());
        p.start();
        p.on_played(1.0, &t0(), &mut rng);
        assert_eq!(
            p.on_played(0.0, &t0(), &mut rng),
            PlayerCommand::Wait(Duration::seconds(1))
        );
    }
}
