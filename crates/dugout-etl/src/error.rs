//! Error type for `dugout-etl`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] dugout_core::Error),

  #[error("transform error: {0}")]
  Transform(#[from] dugout_transform::Error),

  #[error("store error: {0}")]
  Store(#[from] dugout_store_sqlite::Error),

  #[error("configuration error: {0}")]
  Config(#[from] config::ConfigError),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("background task failed: {0}")]
  Join(#[from] tokio::task::JoinError),

  #[error("{0} is not a directory")]
  NotADirectory(PathBuf),

  #[error("operation cancelled")]
  Cancelled,

  /// A load failed; names the dataset and file it was reading.
  #[error("loading {dataset} from {}: {source}", path.display())]
  Source {
    dataset: String,
    path:    PathBuf,
    source:  Box<Error>,
  },
}

impl Error {
  /// True if this error, or the load failure it wraps, is a cancellation.
  pub fn is_cancelled(&self) -> bool {
    match self {
      Error::Cancelled => true,
      Error::Store(dugout_store_sqlite::Error::Cancelled) => true,
      Error::Source { source, .. } => source.is_cancelled(),
      _ => false,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
