use serde::{Deserialize, Serialize};

use crate::alarm::StopReason;
use crate::engine::SkipReason;
use crate::scheduler::Timestamp;
use crate::stats::Achievement;

/// Every observable state change produces an Event.
/// Hosts drain them from the runtime to update their UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    AlarmTriggered {
        alarm_id: String,
        name: String,
        /// Fired by an expired snooze.
        snoozed: bool,
        at: Timestamp,
    },
    /// The probe sound failed; waiting for the user to enable sound.
    AlarmBlocked {
        alarm_id: String,
        at: Timestamp,
    },
    AlarmSoundPlayed {
        alarm_id: String,
        sound: String,
        duration_secs: f64,
        at: Timestamp,
    },
    /// Once per second while ringing.
    AlarmProgress {
        alarm_id: String,
        elapsed_secs: i64,
        remaining_secs: i64,
        at: Timestamp,
    },
    AlarmStopped {
        alarm_id: String,
        reason: StopReason,
        at: Timestamp,
    },
    AlarmSnoozed {
        alarm_id: String,
        until: Timestamp,
        at: Timestamp,
    },
    RandomFartScheduled {
        next_at: Timestamp,
        delay_minutes: u32,
        at: Timestamp,
    },
    RandomFartPlayed {
        sound: String,
        at: Timestamp,
    },
    RandomFartSkipped {
        reason: SkipReason,
        at: Timestamp,
    },
    FartPlayed {
        sound: String,
        at: Timestamp,
    },
    FartRecorded {
        total_farts: u64,
        current_streak: u32,
        at: Timestamp,
    },
    AchievementUnlocked {
        achievement: Achievement,
        at: Timestamp,
    },
    /// The free trial ran out with the fart just recorded.
    TrialEnded {
        at: Timestamp,
    },
    /// A gated action was refused.
    PaywallShown {
        at: Timestamp,
    },
    PremiumUnlocked {
        at: Timestamp,
    },
    CountdownStarted {
        remaining_ms: u64,
        at: Timestamp,
    },
    CountdownPaused {
        remaining_ms: u64,
        at: Timestamp,
    },
    CountdownReset {
        at: Timestamp,
    },
    CountdownCompleted {
        sound: String,
        at: Timestamp,
    },
    FunNotificationSent {
        title: String,
        at: Timestamp,
    },
}

impl Event {
    /// Stable name of the variant, as serialized in `type`.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::AlarmTriggered { .. } => "AlarmTriggered",
            Event::AlarmBlocked { .. } => "AlarmBlocked",
            Event::AlarmSoundPlayed { .. } => "AlarmSoundPlayed",
            Event::AlarmProgress { .. } => "AlarmProgress",
            Event::AlarmStopped { .. } => "AlarmStopped",
            Event::AlarmSnoozed { .. } => "AlarmSnoozed",
            Event::RandomFartScheduled { .. } => "RandomFartScheduled",
            Event::RandomFartPlayed { .. } => "RandomFartPlayed",
            Event::RandomFartSkipped { .. } => "RandomFartSkipped",
            Event::FartPlayed { .. } => "FartPlayed",
            Event::FartRecorded { .. } => "FartRecorded",
            Event::AchievementUnlocked { .. } => "AchievementUnlocked",
            Event::TrialEnded { .. } => "TrialEnded",
            Event::PaywallShown { .. } => "PaywallShown",
            Event::PremiumUnlocked { .. } => "PremiumUnlocked",
            Event::CountdownStarted { .. } => "CountdownStarted",
            Event::CountdownPaused { .. } => "CountdownPaused",
            Event::CountdownReset { .. } => "CountdownReset",
            Event::CountdownCompleted { .. } => "CountdownCompleted",
            Event::FunNotificationSent { .. } => "FunNotificationSent",
        }
    }
}
