//! xng CLI - run the associative network from the command line.

mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::scenario::ScenarioName;
use tracing::Level;

#[derive(Parser)]
#[command(name = "xng")]
#[command(author, version, about = "xng - discrete-event associative spiking network", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default xng.toml
    Init {
        /// Project directory (default: current directory)
        #[arg(short, long)]
        path: Option<String>,
    },

    /// Run a reference scenario and report what fired
    Scenario {
        /// Which scenario to run
        #[arg(value_enum)]
        name: ScenarioName,

        /// Print the final network snapshot as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run the Bernoulli bandit probe
    Bandit {
        /// Number of arms (probabilities drawn from the seed)
        #[arg(short, long)]
        arms: Option<usize>,

        /// Random seed
        #[arg(short, long)]
        seed: Option<u64>,

        /// Start from an empty network instead of wiring every arm
        #[arg(long)]
        hebbian: bool,

        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Init { path } => commands::init::run(path),
        Commands::Scenario { name, json } => {
            let config = config::Config::load()?;
            commands::scenario::run(name, json, &config)
        }
        Commands::Bandit {
            arms,
            seed,
            hebbian,
            json,
        } => {
            let mut config = config::Config::load()?.bandit;
            if let Some(arms) = arms {
                config.arms = arms;
                config.probabilities = None;
            }
            if let Some(seed) = seed {
                config.seed = seed;
            }
            config.hebbian |= hebbian;
            commands::bandit::run(config, json)
        }
    }
}
