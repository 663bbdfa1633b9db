//! Retrosheet game logs: headerless, CRLF, 161 positional fields per game.

use std::io::{Read, Write};

use csv::StringRecord;
use dugout_core::{
  game::GameType,
  schema::{GAME_LOG_FIELD_COUNT, GAMES, TableSchema},
};

use crate::{
  RecordTransform, Result,
  csvio::{canonical_writer, expect_len, lenient_reader},
};

/// Prepends the canonical header and tags every game with `game_type`.
#[derive(Debug, Clone)]
pub struct GameLogTransform {
  game_type: GameType,
}

impl GameLogTransform {
  pub fn new(game_type: GameType) -> Self { Self { game_type } }
}

impl RecordTransform for GameLogTransform {
  fn schema(&self) -> &'static TableSchema { &GAMES }

  fn transform(&self, input: &mut dyn Read, output: &mut dyn Write) -> Result<u64> {
    let mut reader = lenient_reader(input, false);
    let mut writer = canonical_writer(output);
    writer.write_record(GAMES.column_names())?;

    let tag = self.game_type.as_str();
    let mut record = StringRecord::new();
    let mut rows = 0u64;
    while reader.read_record(&mut record)? {
      expect_len(&record, GAME_LOG_FIELD_COUNT)?;
      writer.write_record(record.iter().chain(std::iter::once(tag)))?;
      rows += 1;
    }

    writer.flush()?;
    Ok(rows)
  }
}
