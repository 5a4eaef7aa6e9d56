//! Usage statistics: streaks and achievements.
//!
//! [`record_fart`] is the single place a fart-producing action is
//! accounted. It updates the counters, unlocks achievements and reports
//! the resulting trial state in one call.

mod achievements;

pub use achievements::{Achievement, WEEK_STREAK_DAYS};

use serde::{Deserialize, Serialize};

use crate::gate::TrialStatus;
use crate::scheduler::{day_string, yesterday_string, Timestamp};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UsageStats {
    pub total_farts: u64,
    pub current_streak: u32,
    pub longest_streak: u32,
    /// Calendar day (`YYYY-MM-DD`) of the last recorded fart.
    pub last_fart_date: Option<String>,
    /// Unlock order; each entry at most once, never removed.
    pub achievements: Vec<Achievement>,
}

impl UsageStats {
    pub fn has(&self, achievement: Achievement) -> bool {
        self.achievements.contains(&achievement)
    }
}

/// Pure streak/achievement step for one fart at `now`.
pub fn update(stats: &UsageStats, now: &Timestamp) -> UsageStats {
    let today = day_string(now);
    let yesterday = yesterday_string(now);

    let current_streak = match stats.last_fart_date.as_deref() {
        Some(last) if last == today => stats.current_streak,
        Some(last) if last == yesterday => stats.current_streak + 1,
        _ => 1,
    };
    let total_farts = stats.total_farts + 1;

    let mut achievements = stats.achievements.clone();
    for achievement in Achievement::ALL {
        if achievement.reached(total_farts, current_streak) && !achievements.contains(&achievement) {
            achievements.push(achievement);
        }
    }

    UsageStats {
        total_farts,
        current_streak,
        longest_streak: stats.longest_streak.max(current_streak),
        last_fart_date: Some(today),
        achievements,
    }
}

/// Outcome of [`record_fart`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FartRecord {
    pub newly_unlocked: Vec<Achievement>,
    pub trial: TrialStatus,
    /// The trial ended with this fart.
    pub trial_just_ended: bool,
}

/// Account one fart: apply [`update`] in place and derive trial state.
pub fn record_fart(stats: &mut UsageStats, is_premium: bool, now: &Timestamp) -> FartRecord {
    let before = TrialStatus::new(is_premium, stats.total_farts);
    let next = update(stats, now);
    let newly_unlocked = next
        .achievements
        .iter()
        .copied()
        .filter(|a| !stats.has(*a))
        .collect();
    *stats = next;

    let trial = TrialStatus::new(is_premium, stats.total_farts);
    tracing::debug!(
        total = stats.total_farts,
        streak = stats.current_streak,
        "fart recorded"
    );
    FartRecord {
        newly_unlocked,
        trial_just_ended: trial.just_ended(&before),
        trial,
    }
}
