//! Negro Leagues `gameinfo.csv`.
//!
//! The source is a narrow, one-row-per-game summary. Each row is projected
//! onto the canonical game columns it can fill, numeric placeholders are
//! nulled, and both teams' leagues come from the injected [`TeamLookup`].
//! Plays for these games use the regular [`PlaysTransform`](crate::PlaysTransform).

use std::{
  collections::BTreeSet,
  io::{Read, Write},
  sync::Arc,
};

use chrono::NaiveDate;
use csv::StringRecord;
use dugout_core::{
  reference::TeamLookup,
  schema::{GAMES, TableSchema},
};
use tracing::warn;

use crate::{
  Error, RecordTransform, Result,
  csvio::{HeaderIndex, canonical_writer, expect_len, field, lenient_reader, line_of, clean_numeric},
};

/// Where an output column's value comes from.
#[derive(Debug, Clone, Copy)]
enum Source {
  /// Copied from the named source column.
  Text(&'static str),
  /// Copied with numeric placeholder cleaning.
  Numeric(&'static str),
  Date,
  DayOfWeek,
  GameNumber,
  VisitingLeague,
  HomeLeague,
  GameType,
}

/// Output columns in canonical order, with their sources.
const OUTPUT: &[(&str, Source)] = &[
  ("date", Source::Date),
  ("game_number", Source::GameNumber),
  ("day_of_week", Source::DayOfWeek),
  ("visiting_team", Source::Text("visteam")),
  ("visiting_team_league", Source::VisitingLeague),
  ("home_team", Source::Text("hometeam")),
  ("home_team_league", Source::HomeLeague),
  ("visiting_score", Source::Numeric("vruns")),
  ("home_score", Source::Numeric("hruns")),
  ("day_night", Source::Text("daynight")),
  ("forfeit_info", Source::Text("forfeit")),
  ("park_id", Source::Text("site")),
  ("attendance", Source::Numeric("attendance")),
  ("time_of_game_minutes", Source::Numeric("timeofgame")),
  ("hp_umpire_id", Source::Text("umphome")),
  ("first_base_umpire_id", Source::Text("ump1b")),
  ("second_base_umpire_id", Source::Text("ump2b")),
  ("third_base_umpire_id", Source::Text("ump3b")),
  ("left_field_umpire_id", Source::Text("umplf")),
  ("right_field_umpire_id", Source::Text("umprf")),
  ("winning_pitcher_id", Source::Text("wp")),
  ("losing_pitcher_id", Source::Text("lp")),
  ("saving_pitcher_id", Source::Text("save")),
  ("game_type", Source::GameType),
];

const DATE_FORMATS: &[&str] = &["%Y%m%d", "%Y-%m-%d", "%m/%d/%Y"];

pub struct NegroLeaguesGamesTransform {
  leagues: Arc<dyn TeamLookup>,
}

impl NegroLeaguesGamesTransform {
  pub fn new(leagues: Arc<dyn TeamLookup>) -> Self { Self { leagues } }
}

/// Source column positions resolved once from the header.
struct Columns {
  index:     HeaderIndex,
  date:      usize,
  number:    usize,
  visteam:   usize,
  hometeam:  usize,
  game_type: Option<usize>,
}

impl Columns {
  fn resolve(header: &StringRecord) -> Result<Self> {
    let index = HeaderIndex::new(header)?;
    Ok(Self {
      date:      index.require("date")?,
      number:    index.require("number")?,
      visteam:   index.require("visteam")?,
      hometeam:  index.require("hometeam")?,
      game_type: index.optional("gametype"),
      index,
    })
  }
}

impl RecordTransform for NegroLeaguesGamesTransform {
  fn schema(&self) -> &'static TableSchema { &GAMES }

  fn transform(&self, input: &mut dyn Read, output: &mut dyn Write) -> Result<u64> {
    let mut reader = lenient_reader(input, true);
    let cols = Columns::resolve(reader.headers()?)?;

    let mut writer = canonical_writer(output);
    writer.write_record(OUTPUT.iter().map(|(name, _)| *name))?;

    let mut unmapped = BTreeSet::new();
    let mut record = StringRecord::new();
    let mut values: Vec<String> = Vec::with_capacity(OUTPUT.len());
    let mut rows = 0u64;
    while reader.read_record(&mut record)? {
      expect_len(&record, cols.index.len())?;

      let line = line_of(&record);
      let raw_date = field(&record, Some(cols.date));
      let date = parse_date(raw_date).ok_or_else(|| Error::InvalidDate {
        line,
        value: raw_date.to_owned(),
      })?;
      let visitor = field(&record, Some(cols.visteam));
      let home = field(&record, Some(cols.hometeam));

      values.clear();
      for (_, source) in OUTPUT {
        let value = match *source {
          Source::Text(name) => field(&record, cols.index.optional(name)).to_owned(),
          Source::Numeric(name) => {
            clean_numeric(field(&record, cols.index.optional(name))).to_owned()
          }
          Source::Date => date.format("%Y%m%d").to_string(),
          Source::DayOfWeek => date.format("%a").to_string(),
          Source::GameNumber => match clean_numeric(field(&record, Some(cols.number))) {
            "" => "0".to_owned(),
            n => n.to_owned(),
          },
          Source::VisitingLeague => self.league_of(visitor, &mut unmapped),
          Source::HomeLeague => self.league_of(home, &mut unmapped),
          Source::GameType => match field(&record, cols.game_type) {
            "" => "regular".to_owned(),
            t => t.to_ascii_lowercase(),
          },
        };
        values.push(value);
      }
      writer.write_record(&values)?;
      rows += 1;
    }

    if !unmapped.is_empty() {
      warn!(teams = ?unmapped, "teams without a league mapping; league left empty");
    }

    writer.flush()?;
    Ok(rows)
  }
}

impl NegroLeaguesGamesTransform {
  /// Not every team appears in every league table, so a miss is recorded and
  /// yields an empty league rather than failing the file.
  fn league_of(&self, team: &str, unmapped: &mut BTreeSet<String>) -> String {
    match self.leagues.league(team) {
      Some(league) => league.to_owned(),
      None => {
        if !team.is_empty() {
          unmapped.insert(team.to_owned());
        }
        String::new()
      }
    }
  }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
  DATE_FORMATS
    .iter()
    .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::TeamLeagues;

  const HEADER: &str = "gid,visteam,hometeam,site,date,number,starttime,daynight,innings,\
                        tiebreaker,usedh,htbf,timeofgame,attendance,fieldcond,precip,sky,temp,\
                        winddir,windspeed,oscorer,forfeit,suspend,umphome,ump1b,ump2b,ump3b,\
                        umplf,umprf,wp,lp,save,gametype,vruns,hruns\n";

  fn row(visitor: &str, home: &str, date: &str, attendance: &str, timeofgame: &str) -> String {
    format!(
      "{home}192405030,{visitor},{home},CHI04,{date},0,3:00PM,day,9,,false,,{timeofgame},\
       {attendance},unknown,unknown,unknown,-1,unknown,-1,,,,ump01,,,,,,pitcherw,pitcherl,,\
       regular,3,5\n"
    )
  }

  fn leagues() -> Arc<dyn TeamLookup> {
    Arc::new(TeamLeagues::from_iter([
      ("CAG".to_owned(), "NNL".to_owned()),
      ("KCM".to_owned(), "NNL".to_owned()),
    ]))
  }

  fn run(input: &str) -> Result<Vec<csv::StringRecord>> {
    let mut out = Vec::new();
    NegroLeaguesGamesTransform::new(leagues()).transform(&mut input.as_bytes(), &mut out)?;
    let mut reader = csv::Reader::from_reader(out.as_slice());
    let header: Vec<String> = reader.headers()?.iter().map(str::to_owned).collect();
    assert_eq!(header, OUTPUT.iter().map(|(n, _)| *n).collect::<Vec<_>>());
    Ok(reader.records().collect::<csv::Result<Vec<_>>>()?)
  }

  fn get<'r>(record: &'r csv::StringRecord, column: &str) -> &'r str {
    let idx = OUTPUT.iter().position(|(n, _)| *n == column).unwrap();
    &record[idx]
  }

  #[test]
  fn output_columns_follow_canonical_order() {
    let positions: Vec<usize> = OUTPUT
      .iter()
      .map(|(name, _)| GAMES.column_names().position(|c| c == *name).unwrap())
      .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
  }

  #[test]
  fn projects_and_injects_leagues() {
    let records = run(&format!("{HEADER}{}", row("KCM", "CAG", "19240503", "4200", "125"))).unwrap();
    let r = &records[0];
    assert_eq!(get(r, "date"), "19240503");
    assert_eq!(get(r, "day_of_week"), "Sat");
    assert_eq!(get(r, "game_number"), "0");
    assert_eq!(get(r, "visiting_team"), "KCM");
    assert_eq!(get(r, "visiting_team_league"), "NNL");
    assert_eq!(get(r, "home_team_league"), "NNL");
    assert_eq!(get(r, "visiting_score"), "3");
    assert_eq!(get(r, "home_score"), "5");
    assert_eq!(get(r, "attendance"), "4200");
    assert_eq!(get(r, "time_of_game_minutes"), "125");
    assert_eq!(get(r, "hp_umpire_id"), "ump01");
    assert_eq!(get(r, "winning_pitcher_id"), "pitcherw");
    assert_eq!(get(r, "game_type"), "regular");
  }

  #[test]
  fn placeholders_are_nulled() {
    let records = run(&format!("{HEADER}{}", row("KCM", "CAG", "19240503", "<1000", "unknown"))).unwrap();
    assert_eq!(get(&records[0], "attendance"), "");
    assert_eq!(get(&records[0], "time_of_game_minutes"), "");
  }

  #[test]
  fn unmapped_team_gets_empty_league() {
    let records = run(&format!("{HEADER}{}", row("XYZ", "CAG", "05/03/1924", "", ""))).unwrap();
    assert_eq!(get(&records[0], "date"), "19240503");
    assert_eq!(get(&records[0], "visiting_team_league"), "");
    assert_eq!(get(&records[0], "home_team_league"), "NNL");
  }

  #[test]
  fn bad_date_is_fatal() {
    let err = run(&format!("{HEADER}{}", row("KCM", "CAG", "sometime", "", ""))).unwrap_err();
    assert!(matches!(err, Error::InvalidDate { line: 2, .. }));
  }

  #[test]
  fn missing_required_column_is_fatal() {
    let err = run("gid,visteam,date\nx,KCM,19240503\n").unwrap_err();
    assert!(matches!(err, Error::MissingColumn(ref c) if c == "number"));
  }
}
