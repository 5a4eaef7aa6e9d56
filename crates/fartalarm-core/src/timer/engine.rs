//! Countdown timer engine.
//!
//! A wall-clock-based state machine. It does not use internal threads;
//! the caller is responsible for calling `tick(now)` periodically, and can
//! ask [`CountdownTimer::deadline`] when the next tick matters.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> (Paused | Completed) -> Idle
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut timer = CountdownTimer::new(TimerConfig::default());
//! timer.start(now);
//! // In a loop:
//! timer.tick(now); // Returns Some(Event) when the countdown completes
//! ```

use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::config::TimerConfig;
use crate::error::ValidationError;
use crate::events::Event;
use crate::scheduler::Timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CountdownState {
    Idle,
    Running,
    Paused,
    Completed,
}

/// Operates on wall-clock deltas, no internal thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountdownTimer {
    config: TimerConfig,
    state: CountdownState,
    remaining_ms: u64,
    /// When remaining time was last flushed while running.
    #[serde(default)]
    last_tick: Option<Timestamp>,
}

impl CountdownTimer {
    /// Starts `Idle` with the full configured length remaining.
    pub fn new(config: TimerConfig) -> Self {
        let remaining_ms = config.total_ms();
        Self {
            config,
            state: CountdownState::Idle,
            remaining_ms,
            last_tick: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> CountdownState {
        self.state
    }

    pub fn config(&self) -> &TimerConfig {
        &self.config
    }

    pub fn remaining_ms(&self) -> u64 {
        self.remaining_ms
    }

    /// Whole seconds left, rounded up.
    pub fn remaining_secs(&self) -> u64 {
        self.remaining_ms.div_ceil(1000)
    }

    /// 0.0 .. 1.0 of the configured length elapsed.
    pub fn progress(&self) -> f64 {
        let total = self.config.total_ms();
        if total == 0 {
            return 0.0;
        }
        1.0 - (self.remaining_ms as f64 / total as f64)
    }

    /// When a running countdown will reach zero.
    pub fn deadline(&self) -> Option<Timestamp> {
        match (self.state, self.last_tick) {
            (CountdownState::Running, Some(last)) => {
                Some(last + Duration::milliseconds(self.remaining_ms as i64))
            }
            _ => None,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self, now: &Timestamp) -> Option<Event> {
        match self.state {
            CountdownState::Running => None,
            CountdownState::Idle | CountdownState::Paused | CountdownState::Completed => {
                if self.state == CountdownState::Completed || self.remaining_ms == 0 {
                    self.remaining_ms = self.config.total_ms();
                }
                if self.remaining_ms == 0 {
                    tracing::debug!("zero-length countdown not started");
                    return None;
                }
                self.state = CountdownState::Running;
                self.last_tick = Some(*now);
                Some(Event::CountdownStarted {
                    remaining_ms: self.remaining_ms,
                    at: *now,
                })
            }
        }
    }

    /// Pause, keeping what is left.
    pub fn stop(&mut self, now: &Timestamp) -> Option<Event> {
        if self.state != CountdownState::Running {
            return None;
        }
        self.flush_elapsed(now);
        self.state = CountdownState::Paused;
        self.last_tick = None;
        Some(Event::CountdownPaused {
            remaining_ms: self.remaining_ms,
            at: *now,
        })
    }

    pub fn reset(&mut self, now: &Timestamp) -> Option<Event> {
        self.state = CountdownState::Idle;
        self.last_tick = None;
        self.remaining_ms = self.config.total_ms();
        Some(Event::CountdownReset { at: *now })
    }

    /// Change the length. Resets the countdown.
    pub fn set_time(
        &mut self,
        hours: u32,
        minutes: u32,
        seconds: u32,
        now: &Timestamp,
    ) -> Result<(), ValidationError> {
        let config = TimerConfig {
            hours,
            minutes,
            seconds,
            sound: self.config.sound.clone(),
        };
        config.validate()?;
        self.config = config;
        self.reset(now);
        Ok(())
    }

    pub fn set_sound(&mut self, sound: &str) {
        self.config.sound = sound.to_string();
    }

    /// Call periodically. Returns `Some(Event::CountdownCompleted)` once,
    /// when the countdown reaches zero.
    pub fn tick(&mut self, now: &Timestamp) -> Option<Event> {
        if self.state != CountdownState::Running {
            return None;
        }
        self.flush_elapsed(now);
        if self.remaining_ms > 0 {
            return None;
        }
        self.state = CountdownState::Completed;
        self.last_tick = None;
        Some(Event::CountdownCompleted {
            sound: self.config.sound.clone(),
            at: *now,
        })
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn flush_elapsed(&mut self, now: &Timestamp) {
        if let Some(last) = self.last_tick {
            let elapsed = (*now - last).num_milliseconds().max(0) as u64;
            self.remaining_ms = self.remaining_ms.saturating_sub(elapsed);
            self.last_tick = Some(*now);
        }
    }
}
