use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use fartalarm_core::Config;
use tracing_subscriber::EnvFilter;

mod commands;
mod console;

#[derive(Parser)]
#[command(name = "fartalarm", version, about = "Fart alarms, random farts and the instant-fart button")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Alarm management
    Alarm {
        #[command(subcommand)]
        action: commands::alarm::AlarmAction,
    },
    /// Random fart settings
    Random {
        #[command(subcommand)]
        action: commands::random::RandomAction,
    },
    /// Play one fart right now
    Fart,
    /// Usage statistics and achievements
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Premium status
    Premium {
        #[command(subcommand)]
        action: commands::premium::PremiumAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Print a shell completion script
    Completions {
        shell: Shell,
    },
    /// Run the scheduler until Ctrl-C
    Run,
}

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_env("FARTALARM_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    let config = Config::load_or_default();
    init_tracing(&config.log_level);

    let result = match cli.command {
        Commands::Alarm { action } => commands::alarm::run(action, &config),
        Commands::Random { action } => commands::random::run(action, &config),
        Commands::Fart => commands::fart::run(&config),
        Commands::Stats { action } => commands::stats::run(action, &config),
        Commands::Premium { action } => commands::premium::run(action, &config),
        Commands::Config { action } => commands::config::run(action),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "fartalarm", &mut std::io::stdout());
            Ok(())
        }
        Commands::Run => commands::run::run(&config),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
