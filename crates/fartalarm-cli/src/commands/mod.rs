pub mod alarm;
pub mod config;
pub mod fart;
pub mod premium;
pub mod random;
pub mod run;
pub mod stats;

use std::path::Path;

use fartalarm_core::{Config, Database, Event, Runtime, SoundCatalog};

use crate::console::{ConsolePlayback, LogNotifier};

/// Load the persisted state into a runtime wired to the console.
///
/// Every state-changing runtime call writes back through the database.
pub fn open_runtime(config: &Config) -> Result<Runtime, Box<dyn std::error::Error>> {
    let store = Database::open()?;
    let sounds = Database::open()?;
    let catalog = match &config.audio.sounds_dir {
        Some(dir) => SoundCatalog::scan_dir(Path::new(dir)),
        None => SoundCatalog::default(),
    };
    let runtime = Runtime::load(Box::new(store))?
        .with_sound_store(Box::new(sounds))
        .with_catalog(catalog)
        .with_engine_config(config.engine.clone())
        .with_playback(Box::new(ConsolePlayback::new(config.audio.nominal_sound_secs)))
        .with_notifier(Box::new(LogNotifier));
    Ok(runtime)
}

/// Print the events worth telling a person about.
pub fn report(events: &[Event]) {
    for event in events {
        match event {
            Event::AlarmTriggered { name, .. } => println!("⏰ {name}"),
            Event::AlarmBlocked { alarm_id, .. } => println!("🔇 sound is blocked for {alarm_id}"),
            Event::AlarmStopped { alarm_id, reason, .. } => {
                println!("alarm {alarm_id} stopped ({reason:?})")
            }
            Event::AlarmSnoozed { until, .. } => {
                println!("😴 snoozed until {}", until.format("%H:%M"))
            }
            Event::RandomFartScheduled { next_at, delay_minutes, .. } => {
                println!("next random fart at {} (in {delay_minutes} min)", next_at.format("%H:%M"))
            }
            Event::RandomFartSkipped { reason, .. } => println!("random fart skipped ({reason:?})"),
            Event::AchievementUnlocked { achievement, .. } => println!(
                "{} Achievement unlocked: {}",
                achievement.emoji(),
                achievement.name()
            ),
            Event::TrialEnded { .. } => {
                println!("Free trial over. Run `fartalarm premium unlock` to keep farting.")
            }
            Event::PaywallShown { .. } => {
                println!("The free trial has ended. Unlock premium for unlimited farts.")
            }
            Event::PremiumUnlocked { .. } => println!("👑 Premium unlocked"),
            _ => tracing::debug!(kind = event.kind(), "event"),
        }
    }
}
