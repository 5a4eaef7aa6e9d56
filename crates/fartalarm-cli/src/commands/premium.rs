use clap::Subcommand;
use fartalarm_core::Config;

use super::{open_runtime, report};

#[derive(Subcommand)]
pub enum PremiumAction {
    /// Unlock unlimited farts
    Unlock,
    /// Print trial and premium status as JSON
    Status,
}

pub fn run(action: PremiumAction, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let mut runtime = open_runtime(config)?;

    match action {
        PremiumAction::Unlock => {
            if runtime.state().is_premium {
                println!("already premium");
            } else {
                runtime.set_premium(true);
            }
        }
        PremiumAction::Status => {
            println!("{}", serde_json::to_string_pretty(&runtime.state().trial())?);
        }
    }
    report(&runtime.drain_events());
    Ok(())
}
