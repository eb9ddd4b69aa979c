//! Plexus CLI - Command-line interface for adaptive connection strengths.

mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "plexus")]
#[command(
    author,
    version,
    about = "Plexus - Adaptive connections between agents",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// SQLite database (overrides storage.db_path from plexus.toml)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new Plexus project
    Init {
        /// Project directory (default: current directory)
        #[arg(short, long)]
        path: Option<PathBuf>,
    },

    /// Seed connections between every pair of entities
    Seed {
        /// Entity ids
        #[arg(required = true)]
        entities: Vec<String>,

        /// Compatibility score applied to every pair (0.0 - 1.0)
        #[arg(short, long, default_value = "0.5")]
        compatibility: f64,

        /// Random seed for reproducible strengths
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Record the outcome of one interaction
    Record {
        /// First entity
        a: String,
        /// Second entity
        b: String,

        /// The interaction failed
        #[arg(long)]
        failure: bool,

        /// Degree of success (0.0 - 1.0)
        #[arg(short, long)]
        factor: Option<f64>,

        /// Learning gain applied on success (0.0 - 1.0)
        #[arg(short, long)]
        gain: Option<f64>,

        /// Interaction kind: dialogue, collaboration, exchange, or any custom label
        #[arg(short, long, default_value = "dialogue")]
        kind: String,
    },

    /// Remove weak connections that have gone stale
    Prune {
        /// Strength below which a connection may be pruned
        #[arg(short, long)]
        threshold: Option<f64>,

        /// Seconds without activity before a connection counts as stale
        #[arg(short, long)]
        window_secs: Option<u64>,
    },

    /// Suggest interaction partners for an entity
    Suggest {
        entity: String,

        /// Number of suggestions
        #[arg(short, long, default_value = "5")]
        k: usize,
    },

    /// Show an entity's strongest connections
    Strongest {
        entity: String,

        /// Number of connections
        #[arg(short, long, default_value = "5")]
        limit: usize,
    },

    /// Show network statistics
    Stats {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let db = cli.db;
    let context = || commands::Context::load(db.clone());

    match cli.command {
        Commands::Init { path } => commands::init::run(path),
        Commands::Seed {
            entities,
            compatibility,
            seed,
        } => commands::seed::run(&context()?, &entities, compatibility, seed).await,
        Commands::Record {
            a,
            b,
            failure,
            factor,
            gain,
            kind,
        } => {
            let outcome = commands::record::Outcome {
                success: !failure,
                factor,
                gain,
                kind,
            };
            commands::record::run(&context()?, &a, &b, outcome).await
        }
        Commands::Prune {
            threshold,
            window_secs,
        } => commands::prune::run(&context()?, threshold, window_secs).await,
        Commands::Suggest { entity, k } => commands::suggest::run(&context()?, &entity, k).await,
        Commands::Strongest { entity, limit } => {
            commands::strongest::run(&context()?, &entity, limit).await
        }
        Commands::Stats { json } => commands::stats::run(&context()?, json).await,
    }
}
