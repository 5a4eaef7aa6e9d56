//! Alarm evaluation tick.

use std::collections::HashMap;

use chrono::Duration;

use super::Effect;
use crate::alarm::{AlarmRegistry, Repeat};
use crate::events::Event;
use crate::notify::Notification;
use crate::scheduler::{day_index, day_string, hhmm, Timestamp};

/// Volatile snooze records: alarm id to snooze-until. Never persisted.
#[derive(Debug, Clone, Default)]
pub struct SnoozeBook {
    until: HashMap<String, Timestamp>,
}

impl SnoozeBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a snooze, superseding any earlier one for the same alarm.
    pub fn snooze(&mut self, alarm_id: &str, minutes: u32, now: &Timestamp) -> Timestamp {
        let until = *now + Duration::minutes(i64::from(minutes));
        self.until.insert(alarm_id.to_string(), until);
        until
    }

    pub fn until(&self, alarm_id: &str) -> Option<Timestamp> {
        self.until.get(alarm_id).copied()
    }

    pub fn remove(&mut self, alarm_id: &str) -> Option<Timestamp> {
        self.until.remove(alarm_id)
    }

    pub fn len(&self) -> usize {
        self.until.len()
    }

    pub fn is_empty(&self) -> bool {
        self.until.is_empty()
    }

    pub fn clear(&mut self) {
        self.until.clear();
    }
}

/// One evaluation pass over the registry.
///
/// Does nothing while an alarm is ringing. Otherwise walks the alarms in
/// registry order and activates at most one. An expired snooze and a
/// normal time match compete on equal terms; the earlier alarm wins.
pub fn evaluate_alarms(
    registry: &mut AlarmRegistry,
    snoozes: &mut SnoozeBook,
    alarm_active: bool,
    notifications_enabled: bool,
    now: &Timestamp,
) -> Vec<Effect> {
    if alarm_active {
        return Vec::new();
    }

    let current = hhmm(now);
    let today = day_string(now);
    let day = day_index(now);

    for alarm in registry.iter_mut() {
        if !alarm.enabled {
            if snoozes.until(&alarm.id).is_some_and(|until| *now >= until) {
                tracing::debug!(alarm = %alarm.id, "snooze expired on a disabled alarm, dropped");
                snoozes.remove(&alarm.id);
            }
            continue;
        }

        if let Some(until) = snoozes.until(&alarm.id) {
            if *now < until {
                continue;
            }
            snoozes.remove(&alarm.id);
            tracing::info!(alarm = %alarm.id, name = %alarm.name, "snooze expired, ringing again");

            let mut effects = vec![Effect::Activate {
                alarm: alarm.clone(),
                snoozed: true,
            }];
            if notifications_enabled {
                effects.push(Effect::Notify(Notification::alarm_snoozed(&alarm.name, now)));
            }
            effects.push(Effect::Emit(Event::AlarmTriggered {
                alarm_id: alarm.id.clone(),
                name: alarm.name.clone(),
                snoozed: true,
                at: *now,
            }));
            return effects;
        }

        if alarm.time != current {
            continue;
        }
        if alarm.last_triggered.as_deref() == Some(today.as_str()) {
            continue;
        }
        if !alarm.repeat.allows_day(day) {
            tracing::debug!(alarm = %alarm.id, day, "repeat filter excludes today");
            continue;
        }

        alarm.last_triggered = Some(today);
        if alarm.repeat == Repeat::Once {
            alarm.enabled = false;
        }
        tracing::info!(alarm = %alarm.id, name = %alarm.name, time = %alarm.time, "alarm fired");

        let mut effects = vec![Effect::Activate {
            alarm: alarm.clone(),
            snoozed: false,
        }];
        if notifications_enabled {
            effects.push(Effect::Notify(Notification::alarm(&alarm.name, now)));
        }
        effects.push(Effect::Persist);
        effects.push(Effect::Emit(Event::AlarmTriggered {
            alarm_id: alarm.id.clone(),
            name: alarm.name.clone(),
            snoozed: false,
            at: *now,
        }));
        return effects;
    }

    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alarm::{Alarm, AlarmPatch};
    use chrono::{FixedOffset, TimeZone};

    /// 2026-10-12 is a Monday.
    fn at(d: u32, h: u32, m: u32, s: u32) -> Timestamp {
        FixedOffset::east_opt(3600)
            .unwrap()
            .with_ymd_and_hms(2026, 10, d, h, m, s)
            .unwrap()
    }

    fn registry_with(times: &[(&str, Repeat)]) -> (AlarmRegistry, Vec<String>) {
        let mut registry = AlarmRegistry::new();
        let mut ids = Vec::new();
        for (time, repeat) in times {
            let id = registry.create(&at(12, 0, 0, 0));
            registry.update(
                &id,
                &AlarmPatch {
                    time: Some(time.to_string()),
                    repeat: Some(*repeat),
                    ..Default::default()
                },
            );
            ids.push(id);
        }
        (registry, ids)
    }

    fn activated(effects: &[Effect]) -> Option<(&Alarm, bool)> {
        effects.iter().find_map(|e| match e {
            Effect::Activate { alarm, snoozed } => Some((alarm, *snoozed)),
            _ => None,
        })
    }

    #[test]
    fn fires_on_matching_minute_and_marks_today() {
        let (mut registry, ids) = registry_with(&[("07:00", Repeat::Daily)]);
        let mut snoozes = SnoozeBook::new();

        let effects = evaluate_alarms(&mut registry, &mut snoozes, false, true, &at(12, 7, 0, 3));
        let (alarm, snoozed) = activated(&effects).unwrap();
        assert_eq!(alarm.id, ids[0]);
        assert!(!snoozed);
        assert!(effects.iter().any(Effect::is_persist));
        assert!(effects
            .iter()
            .any(|e| matches!(e, Effect::Notify(n) if n.require_interaction)));
        assert_eq!(
            registry.get(&ids[0]).unwrap().last_triggered.as_deref(),
            Some("2026-10-12")
        );
        assert!(registry.get(&ids[0]).unwrap().enabled);
    }

    #[test]
    fn once_alarm_disables_itself() {
        let (mut registry, ids) = registry_with(&[("07:00", Repeat::Once)]);
        let mut snoozes = SnoozeBook::new();
        evaluate_alarms(&mut registry, &mut snoozes, false, true, &at(12, 7, 0, 0));
        assert!(!registry.get(&ids[0]).unwrap().enabled);
    }

    #[test]
    fn active_alarm_suppresses_evaluation() {
        let (mut registry, ids) = registry_with(&[("07:00", Repeat::Daily)]);
        let mut snoozes = SnoozeBook::new();
        let effects = evaluate_alarms(&mut registry, &mut snoozes, true, true, &at(12, 7, 0, 0));
        assert!(effects.is_empty());
        assert!(registry.get(&ids[0]).unwrap().last_triggered.is_none());
    }

    #[test]
    fn first_match_wins() {
        let (mut registry, ids) =
            registry_with(&[("07:00", Repeat::Daily), ("07:00", Repeat::Daily)]);
        let mut snoozes = SnoozeBook::new();

        let effects = evaluate_alarms(&mut registry, &mut snoozes, false, true, &at(12, 7, 0, 0));
        assert_eq!(activated(&effects).unwrap().0.id, ids[0]);
        assert!(registry.get(&ids[1]).unwrap().last_triggered.is_none());

        // Next tick, slot freed: the second alarm gets its turn.
        let effects = evaluate_alarms(&mut registry, &mut snoozes, false, true, &at(12, 7, 0, 5));
        assert_eq!(activated(&effects).unwrap().0.id, ids[1]);
    }

    #[test]
    fn notifications_disabled_still_activates() {
        let (mut registry, _) = registry_with(&[("07:00", Repeat::Daily)]);
        let mut snoozes = SnoozeBook::new();
        let effects = evaluate_alarms(&mut registry, &mut snoozes, false, false, &at(12, 7, 0, 0));
        assert!(activated(&effects).is_some());
        assert!(!effects.iter().any(|e| matches!(e, Effect::Notify(_))));
    }

    #[test]
    fn snooze_expiry_refires_without_touching_last_triggered() {
        let (mut registry, ids) = registry_with(&[("07:00", Repeat::Daily)]);
        let mut snoozes = SnoozeBook::new();
        evaluate_alarms(&mut registry, &mut snoozes, false, true, &at(12, 7, 0, 0));
        snoozes.snooze(&ids[0], 5, &at(12, 7, 0, 30));

        assert!(evaluate_alarms(&mut registry, &mut snoozes, false, true, &at(12, 7, 5, 29)).is_empty());

        let effects = evaluate_alarms(&mut registry, &mut snoozes, false, true, &at(12, 7, 5, 30));
        let (alarm, snoozed) = activated(&effects).unwrap();
        assert_eq!(alarm.id, ids[0]);
        assert!(snoozed);
        assert!(effects
            .iter()
            .any(|e| matches!(e, Effect::Notify(n) if n.title.ends_with("(Snoozed)"))));
        assert!(snoozes.is_empty());
        assert_eq!(
            registry.get(&ids[0]).unwrap().last_triggered.as_deref(),
            Some("2026-10-12")
        );
    }

    #[test]
    fn pending_snooze_hides_normal_match() {
        let (mut registry, ids) = registry_with(&[("07:10", Repeat::Daily)]);
        let mut snoozes = SnoozeBook::new();
        snoozes.snooze(&ids[0], 15, &at(12, 7, 0, 0));
        assert!(evaluate_alarms(&mut registry, &mut snoozes, false, true, &at(12, 7, 10, 0)).is_empty());
    }

    #[test]
    fn disabled_alarm_drops_its_expired_snooze() {
        let (mut registry, ids) = registry_with(&[("07:00", Repeat::Daily)]);
        let mut snoozes = SnoozeBook::new();
        snoozes.snooze(&ids[0], 5, &at(12, 7, 0, 0));
        registry.toggle(&ids[0]);

        assert!(evaluate_alarms(&mut registry, &mut snoozes, false, true, &at(12, 7, 3, 0)).is_empty());
        assert_eq!(snoozes.len(), 1);

        assert!(evaluate_alarms(&mut registry, &mut snoozes, false, true, &at(12, 7, 5, 0)).is_empty());
        assert!(snoozes.is_empty());

        registry.toggle(&ids[0]);
        assert!(evaluate_alarms(&mut registry, &mut snoozes, false, true, &at(12, 9, 0, 0)).is_empty());
    }

    #[test]
    fn later_snooze_supersedes_earlier() {
        let mut snoozes = SnoozeBook::new();
        snoozes.snooze("a", 5, &at(12, 7, 0, 0));
        let until = snoozes.snooze("a", 15, &at(12, 7, 1, 0));
        assert_eq!(until, at(12, 7, 16, 0));
        assert_eq!(snoozes.len(), 1);
    }
}
