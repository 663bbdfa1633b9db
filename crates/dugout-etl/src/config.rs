//! Runtime configuration, read from an optional TOML file and `DUGOUT_*`
//! environment variables.

use std::path::{Path, PathBuf};

use dugout_core::win_expectancy::{DEFAULT_MIN_SAMPLE_SIZE, EraRange};
use serde::Deserialize;

use crate::Result;

/// Everything the loader needs to know about its environment.
#[derive(Debug, Clone, Deserialize)]
pub struct EtlConfig {
  /// SQLite database file; created if absent.
  pub database_path:     PathBuf,
  /// `team,league` CSV used for Negro Leagues games.
  #[serde(default)]
  pub team_leagues_path: Option<PathBuf>,
  /// `team,team_id,park_id,league` CSV used for park factors.
  #[serde(default)]
  pub team_parks_path:   Option<PathBuf>,
  /// Apply `*.sql` files from here instead of the compiled-in schema.
  #[serde(default)]
  pub migrations_dir:    Option<PathBuf>,
  #[serde(default = "default_min_sample_size")]
  pub min_sample_size:   i64,
  /// Win-expectancy era buckets; empty means one all-time era.
  #[serde(default)]
  pub eras:              Vec<EraRange>,
}

fn default_min_sample_size() -> i64 { DEFAULT_MIN_SAMPLE_SIZE }

impl EtlConfig {
  /// Layer `path` (if it exists) under the environment and validate.
  pub fn load(path: &Path) -> Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("DUGOUT"))
      .build()?;

    let config: EtlConfig = settings.try_deserialize()?;
    for era in &config.eras {
      EraRange::new(era.start, era.end)?;
    }
    Ok(config)
  }
}
