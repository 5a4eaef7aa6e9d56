//! User-recorded sounds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::catalog::CUSTOM_PREFIX;
use crate::error::Result;

/// Maximum number of recordings a user may keep.
pub const MAX_CUSTOM_SOUNDS: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomSound {
    pub id: String,
    pub name: String,
    /// Encoded audio as captured by the recorder.
    #[serde(skip)]
    pub audio: Vec<u8>,
    pub mime_type: String,
    /// Length in seconds, as measured at capture time.
    pub duration: f64,
    pub date_created: DateTime<Utc>,
}

impl CustomSound {
    /// A fresh recording with a generated `custom_` id.
    ///
    /// An empty name is replaced by `Custom Fart <time>`.
    pub fn new(name: &str, audio: Vec<u8>, mime_type: &str, duration: f64) -> Self {
        let now = Utc::now();
        let name = match name.trim() {
            "" => format!("Custom Fart {}", now.format("%H:%M:%S")),
            trimmed => trimmed.to_string(),
        };
        Self {
            id: new_custom_id(),
            name,
            audio,
            mime_type: mime_type.to_string(),
            duration,
            date_created: now,
        }
    }
}

pub fn new_custom_id() -> String {
    format!("{CUSTOM_PREFIX}{}", Uuid::new_v4().simple())
}

/// Blob store for custom recordings.
pub trait CustomSoundStore {
    /// All recordings, oldest first.
    fn get_all(&self) -> Result<Vec<CustomSound>>;
    fn get(&self, id: &str) -> Result<Option<CustomSound>>;
    fn save(&mut self, sound: &CustomSound) -> Result<()>;
    /// Returns whether a record was removed.
    fn delete(&mut self, id: &str) -> Result<bool>;

    fn ids(&self) -> Result<Vec<String>> {
        Ok(self.get_all()?.into_iter().map(|s| s.id).collect())
    }
}

/// Volatile store, for tests and hosts without a blob backend.
#[derive(Debug, Clone, Default)]
pub struct MemorySoundStore {
    sounds: Vec<CustomSound>,
}

impl MemorySoundStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CustomSoundStore for MemorySoundStore {
    fn get_all(&self) -> Result<Vec<CustomSound>> {
        Ok(self.sounds.clone())
    }

    fn get(&self, id: &str) -> Result<Option<CustomSound>> {
        Ok(self.sounds.iter().find(|s| s.id == id).cloned())
    }

    fn save(&mut self, sound: &CustomSound) -> Result<()> {
        match self.sounds.iter_mut().find(|s| s.id == sound.id) {
            Some(existing) => *existing = sound.clone(),
            None => self.sounds.push(sound.clone()),
        }
        Ok(())
    }

    fn delete(&mut self, id: &str) -> Result<bool> {
        let before = self.sounds.len();
        self.sounds.retain(|s| s.id != id);
        Ok(self.sounds.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_sounds_get_custom_ids_and_default_names() {
        let sound = CustomSound::new("  ", vec![1, 2, 3], "audio/webm", 1.5);
        assert!(sound.id.starts_with("custom_"));
        assert!(sound.name.starts_with("Custom Fart "));

        let named = CustomSound::new(" Toot ", vec![], "audio/webm", 0.4);
        assert_eq!(named.name, "Toot");
        assert_ne!(named.id, sound.id);
    }

    #[test]
    fn memory_store_crud() {
        let mut store = MemorySoundStore::new();
        let a = CustomSound::new("a", vec![0], "audio/webm", 1.0);
        let b = CustomSound::new("b", vec![1], "audio/webm", 2.0);
        store.save(&a).unwrap();
        store.save(&b).unwrap();

        assert_eq!(store.ids().unwrap(), vec![a.id.clone(), b.id.clone()]);
        assert_eq!(store.get(&b.id).unwrap().unwrap().name, "b");
        assert!(store.delete(&a.id).unwrap());
        assert!(!store.delete(&a.id).unwrap());
        assert!(store.get(&a.id).unwrap().is_none());
    }
}
