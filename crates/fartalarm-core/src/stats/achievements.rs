use serde::{Deserialize, Serialize};

/// Unlockable milestones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Achievement {
    #[serde(rename = "first_10")]
    First10,
    #[serde(rename = "century")]
    Century,
    #[serde(rename = "fart_master")]
    FartMaster,
    #[serde(rename = "legendary")]
    Legendary,
    #[serde(rename = "week_streak")]
    WeekStreak,
}

/// Streak length that unlocks [`Achievement::WeekStreak`].
pub const WEEK_STREAK_DAYS: u32 = 7;

impl Achievement {
    pub const ALL: [Achievement; 5] = [
        Achievement::First10,
        Achievement::Century,
        Achievement::FartMaster,
        Achievement::Legendary,
        Achievement::WeekStreak,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Achievement::First10 => "first_10",
            Achievement::Century => "century",
            Achievement::FartMaster => "fart_master",
            Achievement::Legendary => "legendary",
            Achievement::WeekStreak => "week_streak",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Achievement::First10 => "Getting Started",
            Achievement::Century => "Century Club",
            Achievement::FartMaster => "Fart Master",
            Achievement::Legendary => "Legendary",
            Achievement::WeekStreak => "Week Warrior",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Achievement::First10 => "🎉",
            Achievement::Century => "💯",
            Achievement::FartMaster => "🏆",
            Achievement::Legendary => "👑",
            Achievement::WeekStreak => "🔥",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Achievement::First10 => "Fart 10 times",
            Achievement::Century => "Fart 100 times",
            Achievement::FartMaster => "Fart 500 times",
            Achievement::Legendary => "Fart 1000 times",
            Achievement::WeekStreak => "7 day streak",
        }
    }

    /// The exact total that unlocks a count-based achievement.
    ///
    /// Matching is by equality: totals only ever move by one per event.
    /// A bulk increment would skip the threshold.
    pub fn count_threshold(self) -> Option<u64> {
        match self {
            Achievement::First10 => Some(10),
            Achievement::Century => Some(100),
            Achievement::FartMaster => Some(500),
            Achievement::Legendary => Some(1000),
            Achievement::WeekStreak => None,
        }
    }

    /// Progress target shown next to the badge.
    pub fn target(self) -> u64 {
        self.count_threshold()
            .unwrap_or(u64::from(WEEK_STREAK_DAYS))
    }

    /// Whether the new totals unlock this achievement.
    pub fn reached(self, total_farts: u64, current_streak: u32) -> bool {
        match self.count_threshold() {
            Some(threshold) => total_farts == threshold,
            None => current_streak >= WEEK_STREAK_DAYS,
        }
    }
}
