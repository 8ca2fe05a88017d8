//! Configuration and CLI argument handling

use std::{path::PathBuf, time::Duration};
use anyhow::bail;
use clap::Parser;

use crate::{
    state::{Durations, Mode},
    tasks::DEFAULT_TICK,
};

/// Used when the platform has no per-user data directory
const FALLBACK_DATA_DIR: &str = ".pomodoro-keeper";

/// CLI argument parsing structure
#[derive(Debug, Parser)]
#[command(name = "pomodoro-keeper")]
#[command(about = "A persistent Pomodoro timer with an HTTP control surface")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Key the session is persisted under
    #[arg(short = 'k', long, default_value = "pomodoro")]
    pub storage_key: String,

    /// Directory holding persisted sessions [default: <user data dir>/pomodoro-keeper]
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Work session length in seconds
    #[arg(long, default_value_t = Durations::DEFAULT_WORK)]
    pub work: u64,

    /// Short break length in seconds
    #[arg(long, default_value_t = Durations::DEFAULT_SHORT_BREAK)]
    pub short_break: u64,

    /// Long break length in seconds
    #[arg(long, default_value_t = Durations::DEFAULT_LONG_BREAK)]
    pub long_break: u64,

    /// Polling interval in milliseconds while a countdown runs
    #[arg(long, default_value_t = DEFAULT_TICK.as_millis() as u64)]
    pub tick_ms: u64,

    /// Count work sessions that finished while the server was down
    #[arg(long)]
    pub credit_missed: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    /// Duration table, rejecting modes that could never count down
    pub fn durations(&self) -> anyhow::Result<Durations> {
        let durations = Durations::new(self.work, self.short_break, self.long_break);
        for mode in Mode::ALL {
            let secs = durations.for_mode(mode);
            if secs == 0 {
                bail!("{} duration must be at least one second", mode);
            }
            if secs > Durations::MAX_SECONDS {
                bail!("{} duration must not exceed {} seconds", mode, Durations::MAX_SECONDS);
            }
        }
        Ok(durations)
    }

    /// Where sessions are stored: `--data-dir`, else the per-user data directory
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .map(|dir| dir.join("pomodoro-keeper"))
                .unwrap_or_else(|| PathBuf::from(FALLBACK_DATA_DIR))
        })
    }

    pub fn tick(&self) -> anyhow::Result<Duration> {
        if self.tick_ms == 0 {
            bail!("tick interval must be at least one millisecond");
        }
        Ok(Duration::from_millis(self.tick_ms))
    }
}
