use clap::Subcommand;
use fartalarm_core::stats::Achievement;
use fartalarm_core::Config;
use serde_json::json;

use super::open_runtime;

#[derive(Subcommand)]
pub enum StatsAction {
    /// Totals, streaks, achievements and trial status
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Clear all statistics (premium included)
    Reset,
}

pub fn run(action: StatsAction, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let mut runtime = open_runtime(config)?;

    match action {
        StatsAction::Show { json } => {
            let state = runtime.state();
            let stats = &state.stats;
            if json {
                let value = json!({
                    "stats": stats,
                    "trial": state.trial(),
                });
                println!("{}", serde_json::to_string_pretty(&value)?);
                return Ok(());
            }
            println!("Total farts:    {}", stats.total_farts);
            println!("Current streak: {} days", stats.current_streak);
            println!("Longest streak: {} days", stats.longest_streak);
            for achievement in Achievement::ALL {
                let mark = if stats.has(achievement) { "✔" } else { " " };
                println!(
                    "[{mark}] {} {}: {}",
                    achievement.emoji(),
                    achievement.name(),
                    achievement.description()
                );
            }
            match state.trial().remaining {
                Some(remaining) => println!("Free farts left: {remaining}"),
                None => println!("Premium"),
            }
        }
        StatsAction::Reset => {
            runtime.reset_stats();
            println!("stats reset");
        }
    }
    Ok(())
}
