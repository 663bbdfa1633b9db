//! Static reference lookups consulted while transforming records.
//!
//! The mappings themselves are never persisted; callers inject whichever
//! provider they like (the transform crate ships CSV-backed ones).

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Resolves a team code to the league it played in.
pub trait TeamLookup: Send + Sync {
  fn league(&self, team: &str) -> Option<&str>;
}

/// Where a team code from an external reference file lives in our data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParkAssignment {
  /// Retrosheet team id.
  pub team_id: String,
  /// Retrosheet park id.
  pub park_id: String,
  pub league:  String,
}

/// Resolves an external team code (e.g. a park-factor publication's team
/// name) to a [`ParkAssignment`].
pub trait ParkLookup: Send + Sync {
  fn park(&self, team: &str) -> Option<&ParkAssignment>;
}

/// The external reference-constant files the pipeline understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConstantsKind {
  Woba,
  ParkFactors,
}

impl ConstantsKind {
  pub fn as_str(self) -> &'static str {
    match self {
      ConstantsKind::Woba => "woba",
      ConstantsKind::ParkFactors => "park-factors",
    }
  }
}

impl fmt::Display for ConstantsKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for ConstantsKind {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "woba" => Ok(ConstantsKind::Woba),
      "park-factors" | "park_factors" | "parkfactors" => Ok(ConstantsKind::ParkFactors),
      other => Err(Error::UnknownConstantsKind(other.to_owned())),
    }
  }
}
