use std::{fs, path::PathBuf, time::Duration};

use clap::Parser;
use serde::Deserialize;
use thiserror::Error;

use crate::house::DEFAULT_COMMIT_ATTEMPTS;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Failed to load from the configuration file")]
    FailedToLoadConfig,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(&'static str),
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "auction-house",
    version,
    about = "run the auction and bidding engine"
)]
pub struct Arguments {
    #[arg(long)]
    pub log_level: Option<String>,

    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    #[arg(long)]
    pub snapshot: Option<PathBuf>,

    #[arg(long)]
    pub sweep_interval_secs: Option<u64>,

    #[arg(long)]
    pub snapshot_interval_secs: Option<u64>,

    #[arg(long)]
    pub max_commit_attempts: Option<usize>,

    #[arg(long)]
    pub delivery_attempts: Option<usize>,

    #[arg(long)]
    pub simulate: Option<bool>,

    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: String,
    pub log_dir: PathBuf,
    pub snapshot: PathBuf,
    pub sweep_interval_secs: u64,
    pub snapshot_interval_secs: u64,
    pub max_commit_attempts: usize,
    pub delivery_attempts: usize,
    pub simulate: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
            log_dir: "logs".into(),
            snapshot: "auctions.bin".into(),
            sweep_interval_secs: 5,
            snapshot_interval_secs: 30,
            max_commit_attempts: DEFAULT_COMMIT_ATTEMPTS,
            delivery_attempts: 3,
            simulate: false,
        }
    }
}

impl Config {
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn snapshot_interval(&self) -> Duration {
        Duration::from_secs(self.snapshot_interval_secs)
    }

    pub fn validate(self) -> Result<Self, CliError> {
        if self.sweep_interval_secs == 0 {
            return Err(CliError::InvalidConfig("sweep_interval_secs must be positive"));
        }

        if self.snapshot_interval_secs == 0 {
            return Err(CliError::InvalidConfig("snapshot_interval_secs must be positive"));
        }

        if self.max_commit_attempts == 0 {
            return Err(CliError::InvalidConfig("max_commit_attempts must be positive"));
        }

        if self.delivery_attempts == 0 {
            return Err(CliError::InvalidConfig("delivery_attempts must be positive"));
        }

        Ok(self)
    }
}

impl Arguments {
    pub fn from_with_config() -> Result<Config, CliError> {
        Arguments::parse().into_config()
    }

    /// Layers command line overrides on top of the config file, or the
    /// defaults when no file is given.
    pub fn into_config(self) -> Result<Config, CliError> {
        let file_config = if let Some(path) = self.config.as_ref() {
            let content = fs::read_to_string(path).map_err(|_| CliError::FailedToLoadConfig)?;
            toml::from_str::<Config>(&content).map_err(|_| CliError::FailedToLoadConfig)?
        } else {
            Config::default()
        };

        Config {
            log_level: self.log_level.unwrap_or(file_config.log_level),
            log_dir: self.log_dir.unwrap_or(file_config.log_dir),
            snapshot: self.snapshot.unwrap_or(file_config.snapshot),
            sweep_interval_secs: self
                .sweep_interval_secs
                .unwrap_or(file_config.sweep_interval_secs),
            snapshot_interval_secs: self
                .snapshot_interval_secs
                .unwrap_or(file_config.snapshot_interval_secs),
            max_commit_attempts: self
                .max_commit_attempts
                .unwrap_or(file_config.max_commit_attempts),
            delivery_attempts: self
                .delivery_attempts
                .unwrap_or(file_config.delivery_attempts),
            simulate: self.simulate.unwrap_or(file_config.simulate),
        }
        .validate()
    }
}
