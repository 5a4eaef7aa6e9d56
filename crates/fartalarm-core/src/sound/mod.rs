//! Sound catalog, custom recordings and the playback gateway.

pub mod catalog;
pub mod custom;
pub mod playback;

pub use catalog::{is_custom, BuiltInSound, SoundCatalog, BUILT_IN_SOUNDS, CLASSIC};
pub use custom::{CustomSound, CustomSoundStore, MemorySoundStore, MAX_CUSTOM_SOUNDS};
pub use playback::{PlaybackGateway, RecordingPlayback};

use rand::Rng;

/// Something the playback gateway can play.
#[derive(Debug, Clone, PartialEq)]
pub enum SoundRef {
    /// A built-in variant file.
    Asset { id: String, path: String },
    /// A user recording.
    Custom(CustomSound),
}

impl SoundRef {
    /// The sound id this reference was resolved from.
    pub fn label(&self) -> &str {
        match self {
            SoundRef::Asset { id, .. } => id,
            SoundRef::Custom(sound) => &sound.id,
        }
    }
}

/// Resolve a sound id to something playable.
///
/// `custom_` ids go through the custom store; a missing recording, a store
/// failure or an unknown built-in id all land on `classic`.
pub fn resolve<R: Rng + ?Sized>(
    id: &str,
    catalog: &SoundCatalog,
    store: &dyn CustomSoundStore,
    rng: &mut R,
) -> SoundRef {
    if is_custom(id) {
        match store.get(id) {
            Ok(Some(sound)) => return SoundRef::Custom(sound),
            Ok(None) => tracing::warn!(sound = id, "custom sound missing, playing classic"),
            Err(e) => tracing::warn!(sound = id, error = %e, "custom sound lookup failed, playing classic"),
        }
        return asset(CLASSIC, catalog, rng);
    }
    let id = if catalog.is_built_in(id) { id } else { CLASSIC };
    asset(id, catalog, rng)
}

fn asset<R: Rng + ?Sized>(id: &str, catalog: &SoundCatalog, rng: &mut R) -> SoundRef {
    SoundRef::Asset {
        id: id.to_string(),
        path: catalog
            .resolve_variant(id, rng)
            .unwrap_or_default()
            .to_string(),
    }
}
