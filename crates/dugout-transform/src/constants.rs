//! External reference constants: wOBA weights and park factors.
//!
//! Both arrive as headered CSV using the publisher's column names. They are
//! renamed onto the canonical columns; park factors additionally resolve the
//! publisher's team code through a [`ParkLookup`], and an unresolvable team
//! fails the whole file.

use std::{
  io::{Read, Write},
  sync::Arc,
};

use csv::StringRecord;
use dugout_core::{
  reference::ParkLookup,
  schema::{PARK_FACTORS, TableSchema, WOBA_CONSTANTS},
};

use crate::{
  Error, RecordTransform, Result,
  csvio::{HeaderIndex, canonical_writer, expect_len, field, lenient_reader, line_of},
};

/// `(canonical column, published column)`.
const WOBA_HEADERS: &[(&str, &str)] = &[
  ("season", "Season"),
  ("woba", "wOBA"),
  ("woba_scale", "wOBAScale"),
  ("w_bb", "wBB"),
  ("w_hbp", "wHBP"),
  ("w_1b", "w1B"),
  ("w_2b", "w2B"),
  ("w_3b", "w3B"),
  ("w_hr", "wHR"),
  ("run_sb", "runSB"),
  ("run_cs", "runCS"),
  ("r_pa", "R/PA"),
  ("r_w", "R/W"),
  ("c_fip", "cFIP"),
];

const PARK_FACTOR_HEADERS: &[(&str, &str)] = &[
  ("basic_5yr", "Basic (5yr)"),
  ("basic_3yr", "3yr"),
  ("basic_1yr", "1yr"),
  ("single", "1B"),
  ("double", "2B"),
  ("triple", "3B"),
  ("home_run", "HR"),
  ("strikeout", "SO"),
  ("walk", "BB"),
  ("ground_ball", "GB"),
  ("fly_ball", "FB"),
  ("line_drive", "LD"),
  ("infield_fly", "IFFB"),
  ("fip", "FIP"),
];

// ─── wOBA ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default)]
pub struct WobaConstantsTransform;

impl RecordTransform for WobaConstantsTransform {
  fn schema(&self) -> &'static TableSchema { &WOBA_CONSTANTS }

  fn transform(&self, input: &mut dyn Read, output: &mut dyn Write) -> Result<u64> {
    let mut reader = lenient_reader(input, true);
    let index = HeaderIndex::new(reader.headers()?)?;
    let positions = WOBA_HEADERS
      .iter()
      .map(|(_, published)| index.require(published))
      .collect::<Result<Vec<_>>>()?;

    let mut writer = canonical_writer(output);
    writer.write_record(WOBA_HEADERS.iter().map(|(canonical, _)| *canonical))?;

    let mut record = StringRecord::new();
    let mut rows = 0u64;
    while reader.read_record(&mut record)? {
      expect_len(&record, index.len())?;
      writer.write_record(positions.iter().map(|&i| field(&record, Some(i))))?;
      rows += 1;
    }

    writer.flush()?;
    Ok(rows)
  }
}

// ─── Park factors ────────────────────────────────────────────────────────────

pub struct ParkFactorsTransform {
  parks: Arc<dyn ParkLookup>,
}

impl ParkFactorsTransform {
  pub fn new(parks: Arc<dyn ParkLookup>) -> Self { Self { parks } }
}

impl RecordTransform for ParkFactorsTransform {
  fn schema(&self) -> &'static TableSchema { &PARK_FACTORS }

  fn transform(&self, input: &mut dyn Read, output: &mut dyn Write) -> Result<u64> {
    let mut reader = lenient_reader(input, true);
    let index = HeaderIndex::new(reader.headers()?)?;
    let season = index.require("Season")?;
    let team = index.require("Team")?;
    let values: Vec<Option<usize>> = PARK_FACTOR_HEADERS
      .iter()
      .map(|(_, published)| index.optional(published))
      .collect();

    let mut writer = canonical_writer(output);
    writer.write_record(
      ["season", "team_id", "park_id", "league"]
        .into_iter()
        .chain(PARK_FACTOR_HEADERS.iter().map(|(canonical, _)| *canonical)),
    )?;

    let mut record = StringRecord::new();
    let mut rows = 0u64;
    while reader.read_record(&mut record)? {
      expect_len(&record, index.len())?;
      let code = field(&record, Some(team));
      let park = self.parks.park(code).ok_or_else(|| Error::UnmappedTeam {
        line: line_of(&record),
        team: code.to_owned(),
      })?;

      writer.write_record(
        [
          field(&record, Some(season)),
          park.team_id.as_str(),
          park.park_id.as_str(),
          park.league.as_str(),
        ]
        .into_iter()
        .chain(values.iter().map(|&i| field(&record, i))),
      )?;
      rows += 1;
    }

    writer.flush()?;
    Ok(rows)
  }
}
