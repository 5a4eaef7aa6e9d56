//! Notification sink and the messages the engine sends through it.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::scheduler::{display_time, Timestamp};

/// Footer appended to every fun reminder.
pub const FUN_FOOTER: &str = "\n\n(Turn off in Settings)";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub title: String,
    pub body: String,
    /// Stay on screen until dismissed.
    #[serde(default)]
    pub require_interaction: bool,
    #[serde(default)]
    pub silent: bool,
}

impl Notification {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            require_interaction: false,
            silent: false,
        }
    }

    /// An alarm that matched its time.
    pub fn alarm(name: &str, now: &Timestamp) -> Self {
        Self {
            require_interaction: true,
            ..Self::new(name, format!("It's {}! Time for a fart!", display_time(now)))
        }
    }

    /// An alarm re-firing after its snooze expired.
    pub fn alarm_snoozed(name: &str, now: &Timestamp) -> Self {
        Self {
            title: format!("{name} (Snoozed)"),
            ..Self::alarm(name, now)
        }
    }

    pub fn random_fart() -> Self {
        Self {
            silent: true,
            ..Self::new("Incoming fart!", "Brace yourself...")
        }
    }

    pub fn fun(title: &str, body: &str) -> Self {
        Self::new(title, format!("{body}{FUN_FOOTER}"))
    }
}

/// OS-level notification delivery. Fire-and-forget: the engine logs a
/// returned error and moves on.
pub trait NotificationSink {
    fn notify(&mut self, notification: &Notification) -> Result<()>;
}

/// Sink that keeps what it was given.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    pub sent: Vec<Notification>,
    /// Reject every notification, like a denied permission.
    pub denied: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn titles(&self) -> Vec<&str> {
        self.sent.iter().map(|n| n.title.as_str()).collect()
    }
}

impl NotificationSink for RecordingNotifier {
    fn notify(&mut self, notification: &Notification) -> Result<()> {
        if self.denied {
            return Err(CoreError::Custom("notification permission denied".into()));
        }
        self.sent.push(notification.clone());
        Ok(())
    }
}

impl<N: NotificationSink> NotificationSink for std::rc::Rc<std::cell::RefCell<N>> {
    fn notify(&mut self, notification: &Notification) -> Result<()> {
        self.borrow_mut().notify(notification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    fn at(h: u32, m: u32) -> Timestamp {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2026, 10, 12, h, m, 0)
            .unwrap()
    }

    #[test]
    fn alarm_messages() {
        let n = Notification::alarm("Wake up", &at(7, 5));
        assert_eq!(n.title, "Wake up");
        assert_eq!(n.body, "It's 7:05 AM! Time for a fart!");
        assert!(n.require_interaction);
        assert!(!n.silent);

        let n = Notification::alarm_snoozed("Wake up", &at(19, 30));
        assert_eq!(n.title, "Wake up (Snoozed)");
        assert_eq!(n.body, "It's 7:30 PM! Time for a fart!");
    }

    #[test]
    fn random_fart_is_silent() {
        let n = Notification::random_fart();
        assert_eq!(n.title, "Incoming fart!");
        assert!(n.silent);
        assert!(!n.require_interaction);
    }

    #[test]
    fn fun_body_has_footer() {
        let n = Notification::fun("Hi", "there");
        assert_eq!(n.body, "there\n\n(Turn off in Settings)");
    }

    #[test]
    fn denied_sink_errors() {
        let mut sink = RecordingNotifier {
            denied: true,
            ..Default::default()
        };
        assert!(sink.notify(&Notification::random_fart()).is_err());
        assert!(sink.sent.is_empty());
    }
}
