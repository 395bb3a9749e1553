//! Command-line argument definitions for the Mapa CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments control the scene and icon library inputs, the
//! output directory, configuration file selection, and logging verbosity.

use clap::Parser;

/// Command-line arguments for the Mapa atlas tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the scene file (JSON with map default, schemas and features)
    #[arg(help = "Path to the scene file")]
    pub input: String,

    /// Path to the icon library (JSON)
    #[arg(short, long)]
    pub icons: Option<String>,

    /// Directory receiving atlas.png and layer.json
    #[arg(short, long, default_value = "out")]
    pub output_dir: String,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
