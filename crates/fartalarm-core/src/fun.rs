//! Occasional reminder notifications, at most a couple a day.

use chrono::Duration;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::notify::Notification;
use crate::scheduler::{day_string, Timestamp};
use crate::stats::{UsageStats, WEEK_STREAK_DAYS};

pub const MAX_PER_DAY: u32 = 2;
/// Chance that an hourly check sends something.
pub const SEND_PROBABILITY: f64 = 0.15;

pub fn first_check_delay() -> Duration {
    Duration::seconds(30)
}

pub fn check_interval() -> Duration {
    Duration::hours(1)
}

const STOCK_MESSAGES: [(&str, &str); 10] = [
    ("Hey there!", "Have you farted today? Your streak depends on it!"),
    ("Daily Reminder", "Don't forget to let one rip today!"),
    ("Fart Check!", "Time for your daily fart. Open the app!"),
    ("Missing You!", "The Fart App misses your toots. Come back!"),
    ("Streak Alert!", "Keep your streak alive - fart today!"),
    ("Achievement Unlocked?", "You're getting closer to your next milestone!"),
    ("Fart O'Clock!", "It's the perfect time for a quick toot!"),
    ("Pro Tip", "Try recording a custom fart sound today!"),
    ("Random Thought", "Did you know the average person farts 14 times a day?"),
    ("Hello!", "Your fart button is feeling lonely..."),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FunNotificationState {
    pub enabled: bool,
    pub last_notification_date: Option<String>,
    pub notifications_today: u32,
}

impl Default for FunNotificationState {
    fn default() -> Self {
        Self {
            enabled: true,
            last_notification_date: None,
            notifications_today: 0,
        }
    }
}

impl FunNotificationState {
    /// Count for `today`; a stale date means zero.
    pub fn sent_on(&self, today: &str) -> u32 {
        match self.last_notification_date.as_deref() {
            Some(last) if last == today => self.notifications_today,
            _ => 0,
        }
    }
}

/// Candidate messages: stat-aware ones first, then the stock pool.
pub fn messages(stats: &UsageStats) -> Vec<(String, String)> {
    let mut out = Vec::new();
    let streak = stats.current_streak;
    if streak > 0 && streak < WEEK_STREAK_DAYS {
        out.push((
            format!("{streak} Day Streak!"),
            format!(
                "You're {} days away from Week Warrior!",
                WEEK_STREAK_DAYS - streak
            ),
        ));
    }
    let total = stats.total_farts;
    if total > 0 && total < 10 {
        out.push((
            "Almost There!".to_string(),
            format!("Just {} more farts to your first achievement!", 10 - total),
        ));
    }
    if (10..100).contains(&total) {
        out.push((
            "Keep Going!".to_string(),
            format!("{} farts until Century Club!", 100 - total),
        ));
    }
    out.extend(
        STOCK_MESSAGES
            .iter()
            .map(|(t, b)| (t.to_string(), b.to_string())),
    );
    out
}

/// One periodic check. Updates `state` and returns the notification to
/// send, if any.
///
/// The first check on a new day always sends; later ones send with
/// [`SEND_PROBABILITY`] until [`MAX_PER_DAY`] is reached.
pub fn check<R: Rng + ?Sized>(
    state: &mut FunNotificationState,
    stats: &UsageStats,
    now: &Timestamp,
    rng: &mut R,
) -> Option<Notification> {
    if !state.enabled {
        return None;
    }
    let today = day_string(now);
    let sent = state.sent_on(&today);
    if sent >= MAX_PER_DAY {
        return None;
    }

    let new_day = state.last_notification_date.as_deref() != Some(today.as_str());
    let lucky = rng.gen_bool(SEND_PROBABILITY);
    if !(lucky || (new_day && sent == 0)) {
        return None;
    }

    let pool = messages(stats);
    let (title, body) = pool.choose(rng)?;
    state.last_notification_date = Some(today);
    state.notifications_today = sent + 1;
    Some(Notification::fun(title, body))
}
