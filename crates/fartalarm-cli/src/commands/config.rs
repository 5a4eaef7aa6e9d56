use clap::Subcommand;
use fartalarm_core::{Config, ConfigError};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print one host setting
    Get {
        /// Dot path, e.g. "engine.snooze_presets" or "audio.nominal_sound_secs"
        key: String,
    },
    /// Change one host setting (takes effect on the next `fartalarm run`)
    Set {
        key: String,
        /// Parsed as JSON when possible, e.g. "[5, 10]" or "3"
        value: String,
    },
    /// Print every host setting as `key = value`
    List,
    /// Restore tick interval, snooze presets and audio defaults
    Reset,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            let value = config.get(&key).ok_or(ConfigError::UnknownKey(key))?;
            println!("{value}");
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            tracing::info!(%key, %value, "config updated");
            println!("{key} = {}", config.get(&key).unwrap_or(value));
        }
        ConfigAction::List => {
            for (key, value) in Config::load()?.entries() {
                println!("{key} = {value}");
            }
        }
        ConfigAction::Reset => {
            Config::default().save()?;
            println!("config reset: tick 5 s, snooze presets 5/10/15 min");
        }
    }
    Ok(())
}
