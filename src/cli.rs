use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Get GitHub Copilot usage metrics.
#[derive(Debug, Parser)]
#[command(name = "copilot-metrics", version, about)]
pub struct Cli {
    /// Create bar charts of suggestions and acceptances by day and language/editor
    #[arg(short = 'g', long)]
    pub graph: bool,

    /// Print the metrics in a human-readable format
    #[arg(short = 'o', long)]
    pub output: bool,

    /// Write the metrics to <org>_YYYYMMDD.csv
    #[arg(short = 'c', long)]
    pub csv: bool,

    /// Upsert the metrics into the configured database table
    #[arg(short = 's', long)]
    pub sql: bool,

    /// Path to config.json (falls back to COPILOT_METRICS_CONFIG, then ./config.json)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Read a saved usage payload instead of calling the API
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Directory for chart SVG files
    #[arg(long, default_value = ".")]
    pub chart_dir: PathBuf,

    /// Directory for the CSV export
    #[arg(long, default_value = ".")]
    pub csv_dir: PathBuf,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Render the stored metrics as an HTML dashboard
    Dashboard {
        /// Write the document to a file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Serve the dashboard over HTTP
    Serve {
        /// Port to listen on (defaults to $PORT, then 8080)
        #[arg(long)]
        port: Option<u16>,
    },
}
