//! CSV-backed reference lookups.
//!
//! `team,league` rows feed [`TeamLeagues`]; `team,team_id,park_id,league`
//! rows feed [`TeamParks`]. Keys are matched exactly after trimming.

use std::{collections::HashMap, fs::File, io::Read, path::Path};

use dugout_core::reference::{ParkAssignment, ParkLookup, TeamLookup};
use serde::Deserialize;

use crate::Result;

#[derive(Debug, Deserialize)]
struct LeagueRow {
  team:   String,
  league: String,
}

#[derive(Debug, Deserialize)]
struct ParkRow {
  team:    String,
  team_id: String,
  park_id: String,
  league:  String,
}

// ─── Team → league ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct TeamLeagues {
  leagues: HashMap<String, String>,
}

impl TeamLeagues {
  pub fn from_reader<R: Read>(input: R) -> Result<Self> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(input);
    let mut leagues = HashMap::new();
    for row in reader.deserialize::<LeagueRow>() {
      let row = row?;
      leagues.insert(row.team, row.league);
    }
    Ok(Self { leagues })
  }

  pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
    Self::from_reader(File::open(path)?)
  }

  pub fn len(&self) -> usize { self.leagues.len() }

  pub fn is_empty(&self) -> bool { self.leagues.is_empty() }
}

impl FromIterator<(String, String)> for TeamLeagues {
  fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
    Self { leagues: iter.into_iter().collect() }
  }
}

impl TeamLookup for TeamLeagues {
  fn league(&self, team: &str) -> Option<&str> {
    self.leagues.get(team).map(String::as_str)
  }
}

// ─── Team → park ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct TeamParks {
  parks: HashMap<String, ParkAssignment>,
}

impl TeamParks {
  pub fn from_reader<R: Read>(input: R) -> Result<Self> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(input);
    let mut parks = HashMap::new();
    for row in reader.deserialize::<ParkRow>() {
      let row = row?;
      parks.insert(row.team, ParkAssignment {
        team_id: row.team_id,
        park_id: row.park_id,
        league:  row.league,
      });
    }
    Ok(Self { parks })
  }

  pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
    Self::from_reader(File::open(path)?)
  }

  pub fn len(&self) -> usize { self.parks.len() }

  pub fn is_empty(&self) -> bool { self.parks.is_empty() }
}

impl FromIterator<(String, ParkAssignment)> for TeamParks {
  fn from_iter<I: IntoIterator<Item = (String, ParkAssignment)>>(iter: I) -> Self {
    Self { parks: iter.into_iter().collect() }
  }
}

impl ParkLookup for TeamParks {
  fn park(&self, team: &str) -> Option<&ParkAssignment> { self.parks.get(team) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn loads_team_leagues() {
    let leagues = TeamLeagues::from_reader("team,league\nCAG, NNL\nBBB,NAL\n".as_bytes()).unwrap();
    assert_eq!(leagues.len(), 2);
    assert_eq!(leagues.league("CAG"), Some("NNL"));
    assert_eq!(leagues.league("XYZ"), None);
  }

  #[test]
  fn loads_team_parks() {
    let parks = TeamParks::from_reader(
      "team,team_id,park_id,league\nRed Sox,BOS,BOS07,AL\n".as_bytes(),
    )
    .unwrap();
    let park = parks.park("Red Sox").unwrap();
    assert_eq!(park.team_id, "BOS");
    assert_eq!(park.park_id, "BOS07");
    assert_eq!(park.league, "AL");
  }

  #[test]
  fn malformed_mapping_is_an_error() {
    assert!(TeamLeagues::from_reader("team\nCAG\n".as_bytes()).is_err());
  }
}
