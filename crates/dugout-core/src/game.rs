//! The `game_type` tag carried by every canonical game row.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Classification of a game, written verbatim into `games.game_type`.
///
/// The named variants cover the values Retrosheet publishes; anything else
/// round-trips through [`GameType::Other`] in lower case.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum GameType {
  #[default]
  Regular,
  Postseason,
  AllStar,
  WorldSeries,
  LeagueChampionship,
  DivisionSeries,
  WildCard,
  Exhibition,
  Other(String),
}

impl GameType {
  pub fn as_str(&self) -> &str {
    match self {
      GameType::Regular => "regular",
      GameType::Postseason => "postseason",
      GameType::AllStar => "allstar",
      GameType::WorldSeries => "worldseries",
      GameType::LeagueChampionship => "lcs",
      GameType::DivisionSeries => "divisionseries",
      GameType::WildCard => "wildcard",
      GameType::Exhibition => "exhibition",
      GameType::Other(s) => s,
    }
  }
}

impl fmt::Display for GameType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for GameType {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    let s = s.trim().to_ascii_lowercase();
    Ok(match s.as_str() {
      "" => return Err(Error::EmptyGameType),
      "regular" => GameType::Regular,
      "postseason" => GameType::Postseason,
      "allstar" => GameType::AllStar,
      "worldseries" => GameType::WorldSeries,
      "lcs" => GameType::LeagueChampionship,
      "divisionseries" => GameType::DivisionSeries,
      "wildcard" => GameType::WildCard,
      "exhibition" => GameType::Exhibition,
      _ => GameType::Other(s),
    })
  }
}

impl TryFrom<String> for GameType {
  type Error = Error;

  fn try_from(s: String) -> Result<Self> { s.parse() }
}

impl From<GameType> for String {
  fn from(t: GameType) -> Self { t.as_str().to_owned() }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_known_and_other_values() {
    assert_eq!("AllStar".parse::<GameType>().unwrap(), GameType::AllStar);
    assert_eq!(" regular ".parse::<GameType>().unwrap(), GameType::Regular);
    assert_eq!(
      "EastWest".parse::<GameType>().unwrap(),
      GameType::Other("eastwest".into())
    );
    assert!(matches!("".parse::<GameType>(), Err(Error::EmptyGameType)));
  }

  #[test]
  fn display_matches_stored_literal() {
    assert_eq!(GameType::WorldSeries.to_string(), "worldseries");
    assert_eq!(GameType::Other("playoff".into()).to_string(), "playoff");
  }
}
