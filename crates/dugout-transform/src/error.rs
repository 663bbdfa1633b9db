//! Error types for the transform crate.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),

  #[error("CSV error: {0}")]
  Csv(#[from] csv::Error),

  #[error("zip error: {0}")]
  Zip(#[from] zip::result::ZipError),

  #[error("{archive:?} has no member ending in any of {suffixes:?}")]
  NoMatchingMember { archive: PathBuf, suffixes: Vec<String> },

  #[error("line {line}: expected {expected} fields, found {found}")]
  RowShape { line: u64, expected: usize, found: usize },

  #[error("input has no header row")]
  EmptyHeader,

  #[error("required column {0:?} missing from header")]
  MissingColumn(String),

  #[error("line {line}: team {team:?} has no reference mapping")]
  UnmappedTeam { line: u64, team: String },

  #[error("line {line}: unrecognised date {value:?}")]
  InvalidDate { line: u64, value: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
