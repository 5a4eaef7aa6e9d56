//! Terminal stand-ins for the audio backend and the notification center.

use fartalarm_core::error::Result;
use fartalarm_core::{Notification, NotificationSink, PlaybackGateway, SoundCatalog, SoundRef};

/// Announces sounds on stdout instead of playing them.
///
/// Built-in sounds "last" the configured nominal length; recordings use
/// their stored duration when they have one.
pub struct ConsolePlayback {
    nominal_secs: f64,
}

impl ConsolePlayback {
    pub fn new(nominal_secs: f64) -> Self {
        Self { nominal_secs }
    }
}

impl PlaybackGateway for ConsolePlayback {
    fn play(&mut self, sound: &SoundRef, volume: f32) -> f64 {
        let (label, duration) = match sound {
            SoundRef::Asset { id, path } => {
                let emoji = SoundCatalog::built_in(id).map_or("💨", |s| s.emoji);
                (format!("{emoji} {id} ({path})"), self.nominal_secs)
            }
            SoundRef::Custom(custom) => {
                let duration = if custom.duration > 0.0 {
                    custom.duration
                } else {
                    self.nominal_secs
                };
                (format!("🎙️ {}", custom.name), duration)
            }
        };
        tracing::debug!(sound = %sound.label(), volume, duration, "play");
        println!("{label}");
        duration
    }

    fn stop(&mut self) {
        tracing::debug!("playback stopped");
    }
}

/// Prints notifications; always delivered.
pub struct LogNotifier;

impl NotificationSink for LogNotifier {
    fn notify(&mut self, notification: &Notification) -> Result<()> {
        tracing::info!(title = %notification.title, silent = notification.silent, "notification");
        println!("🔔 {}: {}", notification.title, notification.body);
        Ok(())
    }
}
