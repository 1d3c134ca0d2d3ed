//! CLI argument definitions using clap
//!
//! Commands:
//! - profile-gateway serve [--config F] [--dir D] [--www W] [--listen ADDR] [--schema S]
//! - profile-gateway verify [--config F] [--dir D] [--schema S]
//! - profile-gateway check-schema --schema S
//! - profile-gateway print-schema [--out F]

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Local HTTP gateway for integrity-checked, schema-validated device profiles
#[derive(Parser, Debug)]
#[command(name = "profile-gateway")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Flags shared by commands that open the profile store
#[derive(Args, Debug, Clone, Default)]
pub struct StoreArgs {
    /// Path to a JSON configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Profile directory (overrides config)
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// Schema file (overrides config; built-in profile schema otherwise)
    #[arg(long)]
    pub schema: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the gateway until the flash marker appears
    Serve {
        #[command(flatten)]
        store: StoreArgs,

        /// Static asset directory (overrides config)
        #[arg(long)]
        www: Option<PathBuf>,

        /// Listen address as host:port (overrides config)
        #[arg(long)]
        listen: Option<String>,
    },

    /// Check every stored profile and report one JSON line per file
    Verify {
        #[command(flatten)]
        store: StoreArgs,
    },

    /// Load and structurally validate a schema file
    CheckSchema {
        /// Schema file to check
        #[arg(long)]
        schema: PathBuf,
    },

    /// Print the built-in profile schema as JSON
    PrintSchema {
        /// Write to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
