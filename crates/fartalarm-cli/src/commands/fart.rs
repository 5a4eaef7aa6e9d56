use fartalarm_core::Config;

use super::{open_runtime, report};

pub fn run(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let mut runtime = open_runtime(config)?;
    if runtime.instant_fart() {
        let stats = &runtime.state().stats;
        println!("Farts: {}  Streak: {} days", stats.total_farts, stats.current_streak);
        if let Some(remaining) = runtime.state().trial().remaining {
            println!("Free farts left: {remaining}");
        }
    }
    report(&runtime.drain_events());
    Ok(())
}
