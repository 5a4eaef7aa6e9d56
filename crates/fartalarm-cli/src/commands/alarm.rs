use clap::{Args, Subcommand, ValueEnum};
use fartalarm_core::{AlarmPatch, Config, Repeat, SoundMode, ValidationError};

use super::{open_runtime, report, run::ring};

#[derive(Clone, Copy, ValueEnum)]
pub enum RepeatArg {
    Once,
    Daily,
    Weekdays,
    Weekends,
}

impl From<RepeatArg> for Repeat {
    fn from(arg: RepeatArg) -> Self {
        match arg {
            RepeatArg::Once => Repeat::Once,
            RepeatArg::Daily => Repeat::Daily,
            RepeatArg::Weekdays => Repeat::Weekdays,
            RepeatArg::Weekends => Repeat::Weekends,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum SoundModeArg {
    Specific,
    Selected,
    Random,
}

impl From<SoundModeArg> for SoundMode {
    fn from(arg: SoundModeArg) -> Self {
        match arg {
            SoundModeArg::Specific => SoundMode::Specific,
            SoundModeArg::Selected => SoundMode::Selected,
            SoundModeArg::Random => SoundMode::Random,
        }
    }
}

#[derive(Args)]
pub struct AlarmFields {
    /// Display name
    #[arg(long)]
    name: Option<String>,
    /// Local time, HH:MM
    #[arg(long)]
    time: Option<String>,
    #[arg(long, value_enum)]
    repeat: Option<RepeatArg>,
    #[arg(long, value_enum)]
    sound_mode: Option<SoundModeArg>,
    /// Sound id for the `specific` mode
    #[arg(long)]
    sound: Option<String>,
    /// Sound ids for the `selected` mode (repeatable)
    #[arg(long = "select")]
    selected: Vec<String>,
    /// Ring duration in seconds (10-600)
    #[arg(long)]
    duration: Option<u32>,
    /// Pause between sounds in seconds (0-5)
    #[arg(long)]
    gap: Option<u32>,
}

impl AlarmFields {
    fn into_patch(self) -> AlarmPatch {
        AlarmPatch {
            name: self.name,
            time: self.time,
            repeat: self.repeat.map(Into::into),
            sound_mode: self.sound_mode.map(Into::into),
            sound: self.sound,
            selected_sounds: (!self.selected.is_empty()).then_some(self.selected),
            duration: self.duration,
            gap_between_sounds: self.gap,
            enabled: None,
        }
    }
}

#[derive(Subcommand)]
pub enum AlarmAction {
    /// Create an alarm
    Add {
        #[command(flatten)]
        fields: AlarmFields,
    },
    /// List alarms
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Edit an alarm
    Update {
        id: String,
        #[command(flatten)]
        fields: AlarmFields,
    },
    /// Delete an alarm
    Remove { id: String },
    /// Enable or disable an alarm
    Toggle { id: String },
    /// Add or remove a sound from an alarm's selection
    ToggleSound { id: String, sound: String },
    /// Ring a copy of an alarm now
    Test { id: String },
}

fn not_found(id: &str) -> ValidationError {
    ValidationError::NotFound {
        kind: "alarm".into(),
        id: id.to_string(),
    }
}

pub fn run(action: AlarmAction, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let mut runtime = open_runtime(config)?;

    match action {
        AlarmAction::Add { fields } => {
            let patch = fields.into_patch();
            patch.validate()?;
            let id = runtime.create_alarm(&patch);
            println!("Alarm created: {id}");
        }
        AlarmAction::List { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(runtime.alarms())?);
            } else if runtime.alarms().is_empty() {
                println!("no alarms");
            } else {
                for alarm in runtime.alarms().iter() {
                    println!(
                        "{}  {}  {:<8}  {:<3}  {}",
                        alarm.id,
                        alarm.time,
                        format!("{:?}", alarm.repeat).to_lowercase(),
                        if alarm.enabled { "on" } else { "off" },
                        alarm.name,
                    );
                }
            }
        }
        AlarmAction::Update { id, fields } => {
            let patch = fields.into_patch();
            patch.validate()?;
            if !runtime.update_alarm(&id, &patch) {
                return Err(not_found(&id).into());
            }
            println!("ok");
        }
        AlarmAction::Remove { id } => {
            if !runtime.remove_alarm(&id) {
                return Err(not_found(&id).into());
            }
            println!("Alarm removed: {id}");
        }
        AlarmAction::Toggle { id } => {
            let enabled = runtime.toggle_alarm(&id).ok_or_else(|| not_found(&id))?;
            println!("{}", if enabled { "enabled" } else { "disabled" });
        }
        AlarmAction::ToggleSound { id, sound } => {
            if !runtime.toggle_alarm_sound(&id, &sound) {
                return Err(format!("cannot toggle {sound} on {id}").into());
            }
            println!("ok");
        }
        AlarmAction::Test { id } => {
            if !runtime.test_alarm(&id) {
                return Err(not_found(&id).into());
            }
            report(&runtime.drain_events());
            ring(&mut runtime)?;
        }
    }
    Ok(())
}
