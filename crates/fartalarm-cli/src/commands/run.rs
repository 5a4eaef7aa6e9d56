//! The long-running scheduler loop.

use std::time::Duration;

use fartalarm_core::{Config, Runtime};
use tokio::io::{AsyncBufReadExt, BufReader};

use super::{open_runtime, report};

/// Longest sleep between polls, so wall-clock jumps are noticed.
const MAX_IDLE: Duration = Duration::from_secs(1);

pub fn run(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let mut runtime = open_runtime(config)?;
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.start();
    report(&runtime.drain_events());
    println!(
        "{} alarm(s) loaded; press Ctrl-C to quit",
        runtime.alarms().iter().filter(|a| a.enabled).count()
    );
    print_controls(runtime.engine_config().snooze_presets.as_slice());

    let result = rt.block_on(drive(&mut runtime, |_| false));
    // A pending stdin read cannot be cancelled.
    rt.shutdown_background();
    result?;
    runtime.shutdown();
    report(&runtime.drain_events());
    Ok(())
}

/// Drive an already-ringing alarm (e.g. `alarm test`) until it stops.
/// Ctrl-C or `s` stops it early.
pub fn ring(runtime: &mut Runtime) -> Result<(), Box<dyn std::error::Error>> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    print_controls(runtime.engine_config().snooze_presets.as_slice());
    let result = rt.block_on(drive(runtime, |r| r.active_alarm().is_none()));
    rt.shutdown_background();
    result?;
    runtime.stop_alarm();
    report(&runtime.drain_events());
    Ok(())
}

fn print_controls(presets: &[u32]) {
    let snooze = presets
        .iter()
        .map(|m| format!("z{m}"))
        .collect::<Vec<_>>()
        .join("/");
    println!("while ringing: s = stop, {snooze} = snooze, e = enable sound");
}

/// A line typed at the terminal while the scheduler runs.
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Stop,
    Snooze(u32),
    EnableSound,
}

fn parse_command(line: &str) -> Option<Command> {
    match line.trim() {
        "s" | "stop" => Some(Command::Stop),
        "e" | "enable" => Some(Command::EnableSound),
        other => other
            .strip_prefix('z')
            .and_then(|m| m.trim().parse().ok())
            .map(Command::Snooze),
    }
}

fn handle_line(runtime: &mut Runtime, line: &str) {
    let Some(command) = parse_command(line) else {
        if !line.trim().is_empty() {
            println!("unknown command: {}", line.trim());
        }
        return;
    };
    let applied = match command {
        Command::Stop => runtime.stop_alarm(),
        Command::Snooze(minutes) => runtime.snooze_alarm(minutes),
        Command::EnableSound => runtime.enable_sound(),
    };
    if !applied {
        println!("nothing to do ({command:?})");
    }
    report(&runtime.drain_events());
}

/// Sleep until the next deadline, poll, repeat. Lines on stdin control a
/// ringing alarm. Returns on Ctrl-C or once `done` holds.
async fn drive(runtime: &mut Runtime, done: impl Fn(&Runtime) -> bool) -> std::io::Result<()> {
    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let mut input_open = true;

    while !done(runtime) {
        let wait = runtime
            .next_deadline()
            .and_then(|at| (at - runtime.now()).to_std().ok())
            .map_or(MAX_IDLE, |wait| wait.min(MAX_IDLE));

        tokio::select! {
            _ = tokio::time::sleep(wait) => {
                let ran = runtime.poll();
                if ran > 0 {
                    tracing::debug!(tasks = ran, "polled");
                }
                report(&runtime.drain_events());
            }
            line = input.next_line(), if input_open => {
                match line? {
                    Some(line) => handle_line(runtime, &line),
                    None => input_open = false,
                }
            }
            signal = tokio::signal::ctrl_c() => {
                signal?;
                tracing::info!("interrupted");
                return Ok(());
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_terminal_commands() {
        assert_eq!(parse_command("s"), Some(Command::Stop));
        assert_eq!(parse_command(" stop "), Some(Command::Stop));
        assert_eq!(parse_command("z10"), Some(Command::Snooze(10)));
        assert_eq!(parse_command("z 5"), Some(Command::Snooze(5)));
        assert_eq!(parse_command("e"), Some(Command::EnableSound));
        assert_eq!(parse_command("zz"), None);
        assert_eq!(parse_command(""), None);
    }
}
