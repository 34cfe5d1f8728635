use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "cadence-cli", version, about = "Cadence CLI")]
struct Cli {
    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Persona timing profiles
    Profile {
        #[command(subcommand)]
        action: commands::profile::ProfileAction,
    },
    /// Ask whether a user may be nudged now
    Evaluate(commands::evaluate::EvaluateArgs),
    /// Report the outcome of a delivered intervention
    Outcome(commands::outcome::OutcomeArgs),
    /// Per-hour outcome statistics for a persona
    Stats(commands::stats::StatsArgs),
    /// Applied interval retunes
    Adaptations(commands::adaptations::AdaptationsArgs),
    /// Run a seeded workday simulation
    Simulate(commands::simulate::SimulateArgs),
    /// Drop history for idle users
    Prune(commands::prune::PruneArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Profile { action } => commands::profile::run(action),
        Commands::Evaluate(args) => commands::evaluate::run(args),
        Commands::Outcome(args) => commands::outcome::run(args),
        Commands::Stats(args) => commands::stats::run(args),
        Commands::Adaptations(args) => commands::adaptations::run(args),
        Commands::Simulate(args) => commands::simulate::run(args),
        Commands::Prune(args) => commands::prune::run(args),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
