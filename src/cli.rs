// src/cli.rs
//! CLI definitions for olx-convert
//!
//! Command implementations live in the `commands` module.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "olx-convert")]
#[command(author = "olx-convert Contributors")]
#[command(version)]
#[command(about = "Convert edX OLX course exports into Moodle course backups", long_about = None)]
pub struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output (debug logging unless RUST_LOG is set)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert a course export into a Moodle backup directory
    Convert {
        /// OLX archive (.tar.gz, .tgz, .tar) or extracted course directory
        archive: PathBuf,

        /// Output backup directory (default: <archive name>-backup)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also pack the backup into this .mbz file
        #[arg(long)]
        mbz: Option<PathBuf>,

        /// Restore the backup with the configured restore command
        #[arg(long)]
        restore: bool,
    },

    /// Parse and build a course without writing anything
    Inspect {
        /// OLX archive or extracted course directory
        archive: PathBuf,
    },
}
