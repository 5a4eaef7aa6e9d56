use clap::{Subcommand, ValueEnum};
use fartalarm_core::alarm::parse_time;
use fartalarm_core::sound::catalog::built_in_ids;
use fartalarm_core::{Config, RandomFartPatch, RandomSoundMode};

use super::{open_runtime, report};

#[derive(Clone, Copy, ValueEnum)]
pub enum RandomModeArg {
    Random,
    Specific,
}

#[derive(Subcommand)]
pub enum RandomAction {
    /// Print the random fart settings as JSON
    Show,
    /// Turn random farts on
    Enable,
    /// Turn random farts off
    Disable,
    /// Change random fart settings
    Set {
        /// Minimum minutes between farts
        #[arg(long)]
        min: Option<u32>,
        /// Maximum minutes between farts
        #[arg(long)]
        max: Option<u32>,
        /// Active hours start, HH:MM (enables active hours)
        #[arg(long)]
        active_start: Option<String>,
        /// Active hours end, HH:MM (enables active hours)
        #[arg(long)]
        active_end: Option<String>,
        /// Fire at any time of day
        #[arg(long, conflicts_with_all = ["active_start", "active_end"])]
        any_time: bool,
        #[arg(long)]
        notifications: Option<bool>,
        #[arg(long, value_enum)]
        mode: Option<RandomModeArg>,
        /// Sounds to pick from (repeatable)
        #[arg(long = "select")]
        selected: Vec<String>,
        /// Select every built-in sound
        #[arg(long, conflicts_with = "selected")]
        select_all: bool,
        /// Clear the selection down to classic
        #[arg(long, conflicts_with_all = ["selected", "select_all"])]
        select_none: bool,
    },
}

pub fn run(action: RandomAction, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let mut runtime = open_runtime(config)?;

    match action {
        RandomAction::Show => {
            let settings = &runtime.state().settings.random_farts;
            println!("{}", serde_json::to_string_pretty(settings)?);
        }
        RandomAction::Enable => {
            runtime.update_random_farts(&RandomFartPatch {
                enabled: Some(true),
                ..Default::default()
            });
            let (min, max) = runtime.state().settings.random_farts.interval_bounds();
            println!("random farts enabled, every {min}-{max} min while `fartalarm run` is active");
        }
        RandomAction::Disable => {
            runtime.update_random_farts(&RandomFartPatch {
                enabled: Some(false),
                ..Default::default()
            });
            println!("random farts disabled");
        }
        RandomAction::Set {
            min,
            max,
            active_start,
            active_end,
            any_time,
            notifications,
            mode,
            selected,
            select_all,
            select_none,
        } => {
            for time in active_start.iter().chain(active_end.iter()) {
                parse_time(time)?;
            }
            let active_hours = if any_time {
                Some(false)
            } else if active_start.is_some() || active_end.is_some() {
                Some(true)
            } else {
                None
            };
            let mut patch = if select_all {
                RandomFartPatch::select_all(built_in_ids())
            } else if select_none {
                RandomFartPatch::select_none()
            } else {
                RandomFartPatch::default()
            };
            patch.min_interval = min;
            patch.max_interval = max;
            patch.active_hours_enabled = active_hours;
            patch.active_hours_start = active_start;
            patch.active_hours_end = active_end;
            patch.show_notifications = notifications;
            patch.sound_mode = mode.map(|m| match m {
                RandomModeArg::Random => RandomSoundMode::Random,
                RandomModeArg::Specific => RandomSoundMode::Specific,
            });
            if !selected.is_empty() {
                patch.selected_sounds = Some(selected);
            }
            runtime.update_random_farts(&patch);
            println!("{}", serde_json::to_string_pretty(&runtime.state().settings.random_farts)?);
        }
    }
    report(&runtime.drain_events());
    Ok(())
}
