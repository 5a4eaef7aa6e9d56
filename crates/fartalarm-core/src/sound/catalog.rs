//! Built-in sound registry.
//!
//! Six categories, each with interchangeable recorded variants. Every call
//! to [`SoundCatalog::resolve_variant`] picks one variant uniformly at random.

use std::collections::HashMap;
use std::path::Path;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

/// The sound every fallback lands on.
pub const CLASSIC: &str = "classic";

/// Ids of user recordings start with this prefix.
pub const CUSTOM_PREFIX: &str = "custom_";

/// A built-in sound category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BuiltInSound {
    pub id: &'static str,
    pub name: &'static str,
    pub emoji: &'static str,
    pub description: &'static str,
    /// Asset folder and file prefix, e.g. `Squeeky/squeeky1.mp3`.
    #[serde(skip)]
    folder: &'static str,
    #[serde(skip)]
    prefix: &'static str,
}

pub const BUILT_IN_SOUNDS: [BuiltInSound; 6] = [
    BuiltInSound {
        id: "classic",
        name: "Classic",
        emoji: "💨",
        description: "Your standard, everyday fart",
        folder: "Classic",
        prefix: "classic",
    },
    BuiltInSound {
        id: "squeaky",
        name: "Squeaky",
        emoji: "🎵",
        description: "High-pitched, comical",
        folder: "Squeeky",
        prefix: "squeeky",
    },
    BuiltInSound {
        id: "thunder",
        name: "Thunder",
        emoji: "⚡",
        description: "Deep, rumbling, impressive",
        folder: "Thunder",
        prefix: "thunder",
    },
    BuiltInSound {
        id: "wet",
        name: "Wet",
        emoji: "💦",
        description: "Bubbly, moist quality",
        folder: "Wet",
        prefix: "wet",
    },
    BuiltInSound {
        id: "long",
        name: "Long",
        emoji: "🌬️",
        description: "Extended duration",
        folder: "Long",
        prefix: "long",
    },
    BuiltInSound {
        id: "rapidfire",
        name: "Rapid Fire",
        emoji: "🔥",
        description: "Quick successive bursts",
        folder: "RapidFire",
        prefix: "rapidfire",
    },
];

const VARIANTS_PER_SOUND: usize = 3;

/// Whether `id` names a user recording.
pub fn is_custom(id: &str) -> bool {
    id.starts_with(CUSTOM_PREFIX)
}

/// Ids of every built-in sound, in catalog order.
pub fn built_in_ids() -> Vec<String> {
    BUILT_IN_SOUNDS.iter().map(|s| s.id.to_string()).collect()
}

#[derive(Debug, Clone)]
pub struct SoundCatalog {
    variants: HashMap<&'static str, Vec<String>>,
}

impl Default for SoundCatalog {
    /// Bundled asset paths: `sounds/<Folder>/<prefix><n>.mp3`, three each.
    fn default() -> Self {
        let variants = BUILT_IN_SOUNDS
            .iter()
            .map(|s| {
                let files = (1..=VARIANTS_PER_SOUND)
                    .map(|n| format!("sounds/{}/{}{}.mp3", s.folder, s.prefix, n))
                    .collect();
                (s.id, files)
            })
            .collect();
        Self { variants }
    }
}

impl SoundCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from an on-disk `sounds/` directory.
    ///
    /// Each category folder contributes its `.mp3` files in sorted order.
    /// Categories whose folder is missing or empty keep the bundled paths.
    pub fn scan_dir(root: &Path) -> Self {
        let mut catalog = Self::default();
        for sound in &BUILT_IN_SOUNDS {
            let folder = root.join(sound.folder);
            let entries = match std::fs::read_dir(&folder) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::debug!(folder = %folder.display(), error = %e, "sound folder unavailable");
                    continue;
                }
            };
            let mut files: Vec<String> = entries
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.path())
                .filter(|path| path.extension().is_some_and(|ext| ext == "mp3"))
                .map(|path| path.to_string_lossy().into_owned())
                .collect();
            files.sort();
            catalog.set_variants(sound.id, files);
        }
        catalog
    }

    /// Replace the variants of a built-in sound. Empty lists are ignored.
    pub fn set_variants(&mut self, id: &str, files: Vec<String>) -> bool {
        let Some(sound) = Self::built_in(id) else {
            return false;
        };
        if files.is_empty() {
            return false;
        }
        self.variants.insert(sound.id, files);
        true
    }

    pub fn list_built_in(&self) -> &'static [BuiltInSound] {
        &BUILT_IN_SOUNDS
    }

    pub fn built_in(id: &str) -> Option<&'static BuiltInSound> {
        BUILT_IN_SOUNDS.iter().find(|s| s.id == id)
    }

    pub fn is_built_in(&self, id: &str) -> bool {
        Self::built_in(id).is_some()
    }

    pub fn variants(&self, id: &str) -> &[String] {
        self.variants.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// One concrete asset for `id`, chosen uniformly among its variants.
    ///
    /// Unknown ids and ids without variants fall back to `classic`.
    pub fn resolve_variant<R: Rng + ?Sized>(&self, id: &str, rng: &mut R) -> Option<&str> {
        let files = match self.variants(id) {
            [] if id != CLASSIC => self.variants(CLASSIC),
            files => files,
        };
        files.choose(rng).map(String::as_str)
    }

    /// A uniformly random built-in id.
    pub fn random_id<R: Rng + ?Sized>(&self, rng: &mut R) -> &'static str {
        BUILT_IN_SOUNDS
            .choose(rng)
            .map(|s| s.id)
            .unwrap_or(CLASSIC)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn default_catalog_has_three_variants_each() {
        let catalog = SoundCatalog::default();
        for sound in catalog.list_built_in() {
            assert_eq!(catalog.variants(sound.id).len(), 3, "{}", sound.id);
        }
        assert_eq!(catalog.variants("squeaky")[0], "sounds/Squeeky/squeeky1.mp3");
    }

    #[test]
    fn resolve_variant_stays_within_category() {
        let catalog = SoundCatalog::default();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let asset = catalog.resolve_variant("thunder", &mut rng).unwrap();
            assert!(asset.starts_with("sounds/Thunder/thunder"));
        }
    }

    #[test]
    fn unknown_ids_fall_back_to_classic() {
        let catalog = SoundCatalog::default();
        let mut rng = StdRng::seed_from_u64(1);
        let asset = catalog.resolve_variant("trombone", &mut rng).unwrap();
        assert!(asset.starts_with("sounds/Classic/"));
    }

    #[test]
    fn set_variants_ignores_empty_and_unknown() {
        let mut catalog = SoundCatalog::default();
        assert!(!catalog.set_variants("wet", vec![]));
        assert!(!catalog.set_variants("nope", vec!["a.mp3".into()]));
        assert!(catalog.set_variants("wet", vec!["/tmp/wet9.mp3".into()]));
        assert_eq!(catalog.variants("wet"), ["/tmp/wet9.mp3".to_string()]);
    }

    #[test]
    fn custom_prefix_detection() {
        assert!(is_custom("custom_abc"));
        assert!(!is_custom("classic"));
    }
}
