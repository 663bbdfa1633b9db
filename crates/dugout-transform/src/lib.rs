//! Archive extraction and record transformation for Dugout.
//!
//! Turns the raw files each source publishes (headerless game logs, plays with
//! ad hoc null sentinels, ejections with a variant column count, the Negro
//! Leagues `gameinfo.csv`, external reference constants) into one canonical
//! form: headered, LF-terminated CSV whose header names are columns of the
//! destination [`TableSchema`]. Pure synchronous code; no database access.
//!
//! # Quick start
//!
//! ```no_run
//! use dugout_core::game::GameType;
//! use dugout_transform::{ArchiveMember, GameLogTransform, RecordTransform};
//!
//! let member = ArchiveMember::extract("gl2023.zip", &[".txt"]).unwrap();
//! let mut output = Vec::new();
//! let rows = GameLogTransform::new(GameType::Regular)
//!   .transform(&mut member.open().unwrap(), &mut output)
//!   .unwrap();
//! println!("{rows} games from {}", member.name());
//! ```

use std::io::{Read, Write};

use dugout_core::schema::TableSchema;

pub mod archive;
mod csvio;
pub mod constants;
pub mod ejections;
pub mod error;
pub mod gamelog;
pub mod lookup;
pub mod negro_leagues;
pub mod plays;

pub use archive::ArchiveMember;
pub use constants::{ParkFactorsTransform, WobaConstantsTransform};
pub use ejections::EjectionsTransform;
pub use error::{Error, Result};
pub use gamelog::GameLogTransform;
pub use lookup::{TeamLeagues, TeamParks};
pub use negro_leagues::NegroLeaguesGamesTransform;
pub use plays::PlaysTransform;

// ─── Transform contract ──────────────────────────────────────────────────────

/// One source format's conversion into canonical CSV.
///
/// Implementations stream record by record so multi-million-row inputs never
/// sit in memory, and return the number of data rows written (the header is
/// not counted).
pub trait RecordTransform: Send + Sync {
  /// The destination table whose columns the output header names.
  fn schema(&self) -> &'static TableSchema;

  fn transform(&self, input: &mut dyn Read, output: &mut dyn Write) -> Result<u64>;
}
