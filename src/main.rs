//! statechart - Command-line editor for statechart model documents
//!
//! Each command loads a document, applies one edit or query, and writes the
//! document back when it changed.

mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use config::Config;
use statechart_core::{ActionId, ActionKind, RegionId, StateId};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "statechart")]
#[command(about = "Edit and inspect hierarchical statechart model documents")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file
    #[arg(short, long, global = true, env = "STATECHART_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Create a new, empty model document
    New {
        /// Document path
        file: PathBuf,

        /// Model name
        #[arg(short, long)]
        name: String,
    },

    /// Show model summary
    Info {
        /// Document path
        file: PathBuf,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the region/state hierarchy
    Tree {
        /// Document path
        file: PathBuf,
    },

    /// Load a document and audit its structure
    Check {
        /// Document path
        file: PathBuf,
    },

    /// Register a shared action
    AddAction {
        /// Document path
        file: PathBuf,

        /// Action kind (entry, exit, guard, action)
        #[arg(short, long)]
        kind: ActionKind,

        /// Action name
        #[arg(short, long)]
        name: String,
    },

    /// Delete a shared action and every reference to it
    DeleteAction {
        /// Document path
        file: PathBuf,

        /// Action ID
        id: ActionId,
    },

    /// Add a state to a region
    AddState {
        /// Document path
        file: PathBuf,

        /// State name
        #[arg(short, long)]
        name: String,

        /// Parent region ID (defaults to the root region)
        #[arg(short, long)]
        region: Option<RegionId>,
    },

    /// Add a child region to a state
    AddRegion {
        /// Document path
        file: PathBuf,

        /// Owning state ID
        #[arg(short, long)]
        state: StateId,

        /// Mark the region as drawn off-page
        #[arg(long)]
        off_page: bool,
    },

    /// Add a transition between two states
    AddTransition {
        /// Document path
        file: PathBuf,

        /// Source state ID
        #[arg(short, long)]
        source: StateId,

        /// Destination state ID
        #[arg(short, long)]
        dest: StateId,

        /// Trigger name
        #[arg(short, long)]
        trigger: Option<String>,
    },

    /// Attach an entry action to a state
    AddEntry {
        /// Document path
        file: PathBuf,

        /// State ID
        #[arg(short, long)]
        state: StateId,

        /// Entry action ID
        #[arg(short, long)]
        action: ActionId,
    },

    /// Attach an exit action to a state
    AddExit {
        /// Document path
        file: PathBuf,

        /// State ID
        #[arg(short, long)]
        state: StateId,

        /// Exit action ID
        #[arg(short, long)]
        action: ActionId,
    },

    /// Rewrite a document in canonical form
    Fmt {
        /// Document path
        file: PathBuf,
    },

    /// Write the effective configuration to a YAML file
    InitConfig {
        /// Output path
        file: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {}", "Error".red(), e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .init();
    tracing::debug!("Configuration: {:?}", config);

    if let Commands::InitConfig { file, force } = &cli.command {
        if file.exists() && !force {
            eprintln!(
                "{}: {} already exists (use --force to overwrite)",
                "Error".red(),
                file.display()
            );
            std::process::exit(1);
        }
        if let Err(e) = config.save(file) {
            eprintln!("{}: {}", "Error".red(), e);
            std::process::exit(1);
        }
        println!("{} configuration {}", "Wrote".green(), file.display());
        return Ok(());
    }

    let options = config.storage.write_options();
    match commands::execute(cli.command, &options) {
        Ok(output) => {
            println!("{}", output);
        }
        Err(e) => {
            eprintln!("{}: {}", "Error".red(), e);
            std::process::exit(1);
        }
    }

    Ok(())
}
