//! Command line interface definition

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// hafiz - content packages for the hafiz tracker
#[derive(Parser)]
#[command(name = "hafiz")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Download and install hafiz content packages")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Use alternate package catalog
    #[arg(long, global = true, value_name = "PATH", env = "HAFIZ_CATALOG")]
    pub catalog: Option<PathBuf>,

    /// Directory installed packages live under
    #[arg(long, global = true, value_name = "DIR")]
    pub content_root: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Download and install packages from the catalog
    #[command(alias = "i")]
    Install {
        /// Package ids
        #[arg(required = true)]
        packages: Vec<String>,
    },

    /// Remove installed packages
    #[command(alias = "rm")]
    Uninstall {
        /// Package ids
        #[arg(required = true)]
        packages: Vec<String>,
    },

    /// Show install state of catalog packages
    Status {
        /// Package ids (empty = every catalog package)
        packages: Vec<String>,
    },

    /// List installed packages
    #[command(alias = "ls")]
    List,

    /// Resolve a file inside an installed package
    Path {
        /// Package id
        package: String,
        /// Path relative to the package root
        relative: String,
    },

    /// Remove leftovers of interrupted installs
    Clean,
}

impl Commands {
    /// Whether the command needs the package catalog
    pub fn needs_catalog(&self) -> bool {
        matches!(self, Self::Install { .. } | Self::Status { .. })
    }
}
