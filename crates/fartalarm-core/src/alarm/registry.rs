use serde::{Deserialize, Serialize};

use super::{Alarm, AlarmPatch};
use crate::scheduler::Timestamp;

/// Ordered alarm collection. Order is insertion order and breaks ties
/// between alarms due in the same minute.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlarmRegistry {
    alarms: Vec<Alarm>,
}

impl AlarmRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an alarm with defaults and append it. Returns its id.
    pub fn create(&mut self, now: &Timestamp) -> String {
        let alarm = Alarm::new(now);
        let id = alarm.id.clone();
        self.alarms.push(alarm);
        id
    }

    /// Append an already-built alarm. Rejects duplicate ids.
    pub fn add(&mut self, alarm: Alarm) -> bool {
        if self.get(&alarm.id).is_some() {
            return false;
        }
        self.alarms.push(alarm);
        true
    }

    /// Returns `false` when no alarm has this id.
    pub fn update(&mut self, id: &str, patch: &AlarmPatch) -> bool {
        match self.get_mut(id) {
            Some(alarm) => {
                patch.apply_to(alarm);
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<Alarm> {
        let index = self.alarms.iter().position(|a| a.id == id)?;
        Some(self.alarms.remove(index))
    }

    /// Flip `enabled`. Returns the new value.
    pub fn toggle(&mut self, id: &str) -> Option<bool> {
        let alarm = self.get_mut(id)?;
        alarm.enabled = !alarm.enabled;
        Some(alarm.enabled)
    }

    /// Add or remove `sound` from an alarm's selection.
    ///
    /// Removing the last selected sound is refused. Returns whether the
    /// selection changed.
    pub fn toggle_selected_sound(&mut self, id: &str, sound: &str) -> bool {
        let Some(alarm) = self.get_mut(id) else {
            return false;
        };
        match alarm.selected_sounds.iter().position(|s| s == sound) {
            Some(_) if alarm.selected_sounds.len() == 1 => false,
            Some(index) => {
                alarm.selected_sounds.remove(index);
                true
            }
            None => {
                alarm.selected_sounds.push(sound.to_string());
                true
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&Alarm> {
        self.alarms.iter().find(|a| a.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Alarm> {
        self.alarms.iter_mut().find(|a| a.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Alarm> {
        self.alarms.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Alarm> {
        self.alarms.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.alarms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alarms.is_empty()
    }
}
