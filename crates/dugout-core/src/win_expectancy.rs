//! Win-expectancy game states and era buckets.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Applied when a caller passes a non-positive minimum sample size.
pub const DEFAULT_MIN_SAMPLE_SIZE: i64 = 50;

/// Score differentials beyond this many runs share a bucket.
pub const SCORE_DIFF_CAP: i64 = 10;

/// An inclusive range of seasons aggregated together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EraRange {
  pub start: i32,
  pub end:   i32,
}

impl EraRange {
  /// Every season on record.
  pub const ALL: EraRange = EraRange { start: 0, end: 9999 };

  pub fn new(start: i32, end: i32) -> Result<Self> {
    if start > end {
      return Err(Error::InvalidEra { start, end });
    }
    Ok(Self { start, end })
  }

  pub fn contains(&self, season: i32) -> bool {
    (self.start..=self.end).contains(&season)
  }
}

/// One row of the win-expectancy table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WinExpectancyEntry {
  pub era:             EraRange,
  pub inning:          i64,
  pub is_bottom:       bool,
  pub outs:            i64,
  /// Occupied bases before the play: first = 1, second = 2, third = 4.
  pub runners:         i64,
  /// Home minus visiting score, clamped to `±SCORE_DIFF_CAP`.
  pub score_diff:      i64,
  pub win_probability: f64,
  pub sample_size:     i64,
}

/// Fall back to [`DEFAULT_MIN_SAMPLE_SIZE`] for non-positive input.
pub fn effective_min_sample_size(requested: i64) -> i64 {
  if requested > 0 { requested } else { DEFAULT_MIN_SAMPLE_SIZE }
}
