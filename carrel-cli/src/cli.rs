use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser, Debug)]
#[command(
    name = "carrel",
    author,
    version,
    about = "Course-notes toolbox: a local PostgreSQL sandbox and notebook/script sync"
)]
pub struct Args {
    /// Path to the config file (defaults to ./carrel.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the sandbox database in the background
    Up {
        /// Block until the database accepts connections
        #[arg(long)]
        wait: bool,

        /// Replace a hand-edited compose file with the managed one
        #[arg(long)]
        force_compose: bool,
    },

    /// Stop the sandbox database
    Down {
        /// Also remove the data volume; the next start is a fresh database
        #[arg(long)]
        volumes: bool,
    },

    /// Show container health and connection state
    Status {
        /// Emit the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Block until the database accepts connections
    Wait,

    /// Convert notebooks to percent scripts
    #[command(name = "to-script")]
    ToScript {
        /// Notebook files (.ipynb)
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Write to this path instead of the derived one (single input only)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Convert percent scripts to notebooks
    #[command(name = "to-notebook")]
    ToNotebook {
        /// Script files (.py)
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Write to this path instead of the derived one (single input only)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Bring script/notebook pairs in sync, following the newer side
    Sync {
        /// Either side of each pair; defaults to [sync] paths from carrel.toml
        paths: Vec<PathBuf>,
    },

    /// Inspect or create the configuration
    Config {
        /// Print the resolved configuration
        #[arg(long)]
        show: bool,

        /// Write a default carrel.toml
        #[arg(long)]
        init: bool,
    },

    /// Generate shell completion scripts
    Completions {
        /// Target shell
        shell: Shell,
    },
}
