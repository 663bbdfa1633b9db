//! Error type for `dugout-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] dugout_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("csv error: {0}")]
  Csv(#[from] csv::Error),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// The migration source yielded nothing; this is a packaging error, never
  /// "up to date".
  #[error("no migrations were found")]
  NoMigrations,

  #[error("migration {0:?} appears more than once")]
  DuplicateMigration(String),

  /// A single migration failed and was rolled back. Earlier migrations stay
  /// applied.
  #[error("migration {name:?} failed: {source}")]
  Migration {
    name:   String,
    source: rusqlite::Error,
  },

  #[error("source column {column:?} does not exist in table {table:?}")]
  UnknownColumn { table: &'static str, column: String },

  #[error("source column {column:?} appears twice")]
  DuplicateColumn { column: String },

  #[error("source is missing key column {column:?} of table {table:?}")]
  MissingKeyColumn {
    table:  &'static str,
    column: &'static str,
  },

  #[error("source has an empty header")]
  EmptyHeader,

  #[error("row {line}: expected {expected} fields, found {found}")]
  RowShape {
    line:     u64,
    expected: usize,
    found:    usize,
  },

  #[error("operation cancelled")]
  Cancelled,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
