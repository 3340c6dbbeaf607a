//! CLI argument definitions

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use crate::config::TimeGraphConfig;

#[derive(Parser, Debug)]
#[command(
    name = "chronoscope",
    about = "Browse a recorded profiling capture as an interactive timeline",
    after_help = "\
EXAMPLES:
    chronoscope capture.json                       Replay and browse in the terminal
    chronoscope capture.json --headless            Print the track summary
    chronoscope capture.json --replay-rate 5000    Replay 5000 timers per second"
)]
pub struct Args {
    /// Capture file to load (JSON)
    #[arg(value_name = "CAPTURE")]
    pub capture: PathBuf,

    /// Print a summary instead of starting the terminal UI
    #[arg(long)]
    pub headless: bool,

    /// Engine config file (JSON); missing keys keep their defaults
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Width of the window shown by zoom-to-fit, in seconds
    #[arg(long, value_name = "SECONDS")]
    pub history_seconds: Option<f64>,

    /// Only show threads whose name contains one of these space-separated words
    #[arg(short, long, value_name = "WORDS")]
    pub filter: Option<String>,

    /// Timers replayed per second (0 = as fast as possible)
    #[arg(long, default_value = "0")]
    pub replay_rate: u64,
}

impl Args {
    /// Engine config: the `--config` file (or defaults) with CLI overrides
    pub fn time_graph_config(&self) -> Result<TimeGraphConfig> {
        let mut config = match &self.config {
            Some(path) => TimeGraphConfig::from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => TimeGraphConfig::default(),
        };
        if let Some(seconds) = self.history_seconds {
            config.history_seconds = seconds;
        }
        config.validate().context("Invalid engine configuration")?;
        Ok(config)
    }
}
