use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};

#[derive(Debug, Parser)]
#[command(
    name = "umbrella",
    version,
    about = "Signature scan of scene files and scripts for embedded malicious code"
)]
pub struct Args {
    /// File or directory to scan
    pub path: PathBuf,

    /// Output format
    #[arg(long, default_value = "json")]
    pub format: OutputFormat,

    /// Write output to a file instead of stdout
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Engine configuration file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Maximum bytes read from each file; overrides the configuration file
    #[arg(long)]
    pub max_scan_bytes: Option<u64>,

    /// Scan worker threads, 0 for automatic; overrides the configuration file
    #[arg(long, short = 'j')]
    pub jobs: Option<usize>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
}

impl Args {
    pub fn log_directive(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
