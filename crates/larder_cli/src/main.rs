//! Larder CLI
//!
//! Command-line tools for the Larder sync engine.
//!
//! # Commands
//!
//! - `show` - Display local collection contents and counts
//! - `import` - Load records from a JSON file into a collection
//! - `push` / `pull` / `sync` - One-shot cycles against the remote
//! - `daemon` - Run the schedule coordinator until interrupted

mod commands;

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Larder sync command-line tools.
#[derive(Parser)]
#[command(name = "larder")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the local store directory
    #[arg(global = true, short, long, default_value = "./larder-data")]
    store: PathBuf,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Which remote transport to sync against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Transport {
    /// The sync REST API
    Rest,
    /// A cloud-drive backup folder
    Drive,
}

/// Remote connection arguments shared by the sync commands.
#[derive(Args)]
struct RemoteArgs {
    /// Remote transport
    #[arg(long, value_enum, default_value = "rest")]
    transport: Transport,

    /// Base URL override (REST API base, or drive API base)
    #[arg(long)]
    url: Option<String>,

    /// Bearer token for the remote
    #[arg(long)]
    token: String,

    /// Email of the signed-in account
    #[arg(long)]
    email: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Display local collection contents and counts
    Show {
        /// Limit output to one collection
        #[arg(short, long)]
        collection: Option<String>,

        /// Print full records instead of counts
        #[arg(short, long)]
        records: bool,
    },

    /// Load records from a JSON file into a collection
    Import {
        /// Target collection (recipes, orders, customers, ingredients,
        /// inventory, categories)
        collection: String,

        /// JSON file holding an array of records
        file: PathBuf,
    },

    /// Push local collections to the remote
    Push {
        #[command(flatten)]
        remote: RemoteArgs,
    },

    /// Pull the remote snapshot and merge it locally
    Pull {
        #[command(flatten)]
        remote: RemoteArgs,
    },

    /// Push then pull as one cycle
    Sync {
        #[command(flatten)]
        remote: RemoteArgs,
    },

    /// Run the schedule coordinator until interrupted
    Daemon {
        #[command(flatten)]
        remote: RemoteArgs,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Show {
            collection,
            records,
        } => commands::show::run(&cli.store, collection.as_deref(), records)?,
        Commands::Import { collection, file } => {
            commands::import::run(&cli.store, &collection, &file)?
        }
        Commands::Push { remote } => commands::cycle::push(&cli.store, &remote).await?,
        Commands::Pull { remote } => commands::cycle::pull(&cli.store, &remote).await?,
        Commands::Sync { remote } => commands::cycle::sync(&cli.store, &remote).await?,
        Commands::Daemon { remote } => commands::daemon::run(&cli.store, &remote).await?,
        Commands::Version => {
            println!("Larder CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
