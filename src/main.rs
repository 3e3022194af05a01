//! ctxstore CLI - seed, freeze and read stores from the command line

use clap::{Parser, Subcommand};
use colored::Colorize;

use ctxstore::seed::{Assignment, Lookup};
use ctxstore::simulate::{self, Mode};
use ctxstore::{ConfigStore, FixSuggestion, StoreError};

#[derive(Parser)]
#[command(name = "ctxstore")]
#[command(about = "Config, shared and execution-scoped key/value stores")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Boot a configuration store, optionally freeze it, then read it back
    Config {
        /// Startup assignment KEY=VALUE (repeatable)
        #[arg(short, long = "set", value_name = "KEY=VALUE")]
        sets: Vec<Assignment>,

        /// Freeze the store after the startup assignments
        #[arg(long)]
        freeze: bool,

        /// Read KEY or KEY:TYPE (int, float, bool, str, any) after boot (repeatable)
        #[arg(short, long = "get", value_name = "KEY[:TYPE]")]
        gets: Vec<Lookup>,

        /// Assignment applied after boot, rejected for frozen existing keys (repeatable)
        #[arg(long = "then-set", value_name = "KEY=VALUE")]
        then_sets: Vec<Assignment>,
    },

    /// Run units of work over recycled workers and check scoped-store isolation
    Simulate {
        /// Number of workers
        #[arg(short, long, default_value_t = 4)]
        workers: usize,

        /// Number of units of work
        #[arg(short, long, default_value_t = 1000)]
        requests: u64,

        /// Execution-context model
        #[arg(short, long, value_enum, default_value_t = Mode::Task)]
        mode: Mode,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Config {
            sets,
            freeze,
            gets,
            then_sets,
        } => run_config(sets, freeze, gets, then_sets).map_err(anyhow::Error::from),
        Commands::Simulate {
            workers,
            requests,
            mode,
        } => run_simulate(workers, requests, mode).await,
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        if let Some(suggestion) = e.downcast_ref::<StoreError>().and_then(|s| s.fix_suggestion()) {
            eprintln!("  {} {}", "Fix:".yellow(), suggestion);
        }
        std::process::exit(1);
    }
}

fn run_config(
    sets: Vec<Assignment>,
    freeze: bool,
    gets: Vec<Lookup>,
    then_sets: Vec<Assignment>,
) -> Result<(), StoreError> {
    // The binary is the composition root: the store is owned here
    let config = ConfigStore::new();

    for assignment in sets {
        assignment.apply(&config)?;
    }
    if freeze {
        config.freeze();
    }

    println!(
        "{} Booted {} keys{}",
        "✓".green(),
        config.len(),
        if config.is_immutable() { " (frozen)" } else { "" }
    );

    for lookup in &gets {
        let value = lookup.read(&config)?;
        println!("  {} = {}", lookup.to_string().cyan(), value);
    }

    for assignment in then_sets {
        let key = assignment.key.clone();
        assignment.apply(&config)?;
        println!("  {} {}", "updated".yellow(), key.cyan());
    }

    Ok(())
}

async fn run_simulate(workers: usize, requests: u64, mode: Mode) -> anyhow::Result<()> {
    let report = simulate::run(mode, workers, requests).await?;

    if report.is_clean() {
        println!("{} {}", "✓".green(), report);
        Ok(())
    } else {
        Err(anyhow::anyhow!("isolation violated: {report}"))
    }
}
