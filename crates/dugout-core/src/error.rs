//! Error types for `dugout-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("game type must not be empty")]
  EmptyGameType,

  #[error("unknown reference constants kind: {0:?}")]
  UnknownConstantsKind(String),

  #[error("invalid era range {start}..={end}")]
  InvalidEra { start: i32, end: i32 },

  /// A migration source could not be read.
  #[error("migration source error: {0}")]
  MigrationSource(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
