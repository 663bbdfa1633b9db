//! Declarative table descriptors.
//!
//! Every destination table the pipeline writes is described here exactly once:
//! the ordered column list (with a type hint), the identity columns used as the
//! conflict target, and the default conflict policy applied on reload. The
//! transformers emit headers from these lists and the loader builds its
//! staging and merge statements from them.

// ─── Descriptor types ────────────────────────────────────────────────────────

/// Storage type hint for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
  Text,
  Integer,
  Real,
}

impl ColumnType {
  pub fn sql(self) -> &'static str {
    match self {
      ColumnType::Text => "TEXT",
      ColumnType::Integer => "INTEGER",
      ColumnType::Real => "REAL",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
  pub name: &'static str,
  pub ty:   ColumnType,
}

impl Column {
  pub const fn text(name: &'static str) -> Self {
    Self { name, ty: ColumnType::Text }
  }

  pub const fn integer(name: &'static str) -> Self {
    Self { name, ty: ColumnType::Integer }
  }

  pub const fn real(name: &'static str) -> Self {
    Self { name, ty: ColumnType::Real }
  }
}

/// What happens when a loaded row collides with an existing identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictPolicy {
  /// Keep the existing row untouched. Used for immutable facts.
  Ignore,
  /// Overwrite only the named columns with the incoming values.
  Update(&'static [&'static str]),
  /// Overwrite every loaded column that is not part of the conflict key.
  UpdateAll,
}

/// The shape of one destination table.
#[derive(Debug, Clone, Copy)]
pub struct TableSchema {
  pub name:         &'static str,
  pub columns:      &'static [Column],
  /// Identity columns; must match the table's primary key.
  pub conflict_key: &'static [&'static str],
  pub policy:       ConflictPolicy,
}

impl TableSchema {
  pub fn column(&self, name: &str) -> Option<&'static Column> {
    self.columns.iter().find(|c| c.name == name)
  }

  pub fn column_names(&self) -> impl Iterator<Item = &'static str> + '_ {
    self.columns.iter().map(|c| c.name)
  }

  pub fn is_key(&self, name: &str) -> bool {
    self.conflict_key.contains(&name)
  }
}

// ─── Games ───────────────────────────────────────────────────────────────────

/// Number of positional fields in a Retrosheet game-log row.
pub const GAME_LOG_FIELD_COUNT: usize = 161;

/// The Retrosheet game-log fields, in file order.
pub const GAME_LOG_COLUMNS: &[Column] = GAME_COLUMNS.split_at(GAME_LOG_FIELD_COUNT).0;

/// Columns a standard game-log reload may change.
pub const GAME_TAG_COLUMNS: &[&str] = &["game_type"];

/// Columns a Negro Leagues reload may change; league assignments for those
/// teams are revised between source releases.
pub const NEGRO_LEAGUES_TAG_COLUMNS: &[&str] =
  &["game_type", "home_team_league", "visiting_team_league"];

pub const GAMES: TableSchema = TableSchema {
  name:         "games",
  columns:      GAME_COLUMNS,
  conflict_key: &["date", "home_team", "game_number"],
  policy:       ConflictPolicy::Update(GAME_TAG_COLUMNS),
};

/// Canonical wide game schema: the game-log fields followed by `game_type`.
pub const GAME_COLUMNS: &[Column] = &[
  Column::text("date"),
  Column::integer("game_number"),
  Column::text("day_of_week"),
  Column::text("visiting_team"),
  Column::text("visiting_team_league"),
  Column::integer("visiting_team_game_number"),
  Column::text("home_team"),
  Column::text("home_team_league"),
  Column::integer("home_team_game_number"),
  Column::integer("visiting_score"),
  Column::integer("home_score"),
  Column::integer("length_in_outs"),
  Column::text("day_night"),
  Column::text("completion_info"),
  Column::text("forfeit_info"),
  Column::text("protest_info"),
  Column::text("park_id"),
  Column::integer("attendance"),
  Column::integer("time_of_game_minutes"),
  Column::text("visiting_line_score"),
  Column::text("home_line_score"),
  Column::integer("visiting_at_bats"),
  Column::integer("visiting_hits"),
  Column::integer("visiting_doubles"),
  Column::integer("visiting_triples"),
  Column::integer("visiting_home_runs"),
  Column::integer("visiting_rbi"),
  Column::integer("visiting_sacrifice_hits"),
  Column::integer("visiting_sacrifice_flies"),
  Column::integer("visiting_hit_by_pitch"),
  Column::integer("visiting_walks"),
  Column::integer("visiting_intentional_walks"),
  Column::integer("visiting_strikeouts"),
  Column::integer("visiting_stolen_bases"),
  Column::integer("visiting_caught_stealing"),
  Column::integer("visiting_grounded_into_double_plays"),
  Column::integer("visiting_catcher_interference"),
  Column::integer("visiting_left_on_base"),
  Column::integer("visiting_pitchers_used"),
  Column::integer("visiting_individual_earned_runs"),
  Column::integer("visiting_team_earned_runs"),
  Column::integer("visiting_wild_pitches"),
  Column::integer("visiting_balks"),
  Column::integer("visiting_putouts"),
  Column::integer("visiting_assists"),
  Column::integer("visiting_errors"),
  Column::integer("visiting_passed_balls"),
  Column::integer("visiting_double_plays"),
  Column::integer("visiting_triple_plays"),
  Column::integer("home_at_bats"),
  Column::integer("home_hits"),
  Column::integer("home_doubles"),
  Column::integer("home_triples"),
  Column::integer("home_home_runs"),
  Column::integer("home_rbi"),
  Column::integer("home_sacrifice_hits"),
  Column::integer("home_sacrifice_flies"),
  Column::integer("home_hit_by_pitch"),
  Column::integer("home_walks"),
  Column::integer("home_intentional_walks"),
  Column::integer("home_strikeouts"),
  Column::integer("home_stolen_bases"),
  Column::integer("home_caught_stealing"),
  Column::integer("home_grounded_into_double_plays"),
  Column::integer("home_catcher_interference"),
  Column::integer("home_left_on_base"),
  Column::integer("home_pitchers_used"),
  Column::integer("home_individual_earned_runs"),
  Column::integer("home_team_earned_runs"),
  Column::integer("home_wild_pitches"),
  Column::integer("home_balks"),
  Column::integer("home_putouts"),
  Column::integer("home_assists"),
  Column::integer("home_errors"),
  Column::integer("home_passed_balls"),
  Column::integer("home_double_plays"),
  Column::integer("home_triple_plays"),
  Column::text("hp_umpire_id"),
  Column::text("hp_umpire_name"),
  Column::text("first_base_umpire_id"),
  Column::text("first_base_umpire_name"),
  Column::text("second_base_umpire_id"),
  Column::text("second_base_umpire_name"),
  Column::text("third_base_umpire_id"),
  Column::text("third_base_umpire_name"),
  Column::text("left_field_umpire_id"),
  Column::text("left_field_umpire_name"),
  Column::text("right_field_umpire_id"),
  Column::text("right_field_umpire_name"),
  Column::text("visiting_manager_id"),
  Column::text("visiting_manager_name"),
  Column::text("home_manager_id"),
  Column::text("home_manager_name"),
  Column::text("winning_pitcher_id"),
  Column::text("winning_pitcher_name"),
  Column::text("losing_pitcher_id"),
  Column::text("losing_pitcher_name"),
  Column::text("saving_pitcher_id"),
  Column::text("saving_pitcher_name"),
  Column::text("game_winning_rbi_batter_id"),
  Column::text("game_winning_rbi_batter_name"),
  Column::text("visiting_starting_pitcher_id"),
  Column::text("visiting_starting_pitcher_name"),
  Column::text("home_starting_pitcher_id"),
  Column::text("home_starting_pitcher_name"),
  Column::text("visiting_batter_1_id"),
  Column::text("visiting_batter_1_name"),
  Column::integer("visiting_batter_1_position"),
  Column::text("visiting_batter_2_id"),
  Column::text("visiting_batter_2_name"),
  Column::integer("visiting_batter_2_position"),
  Column::text("visiting_batter_3_id"),
  Column::text("visiting_batter_3_name"),
  Column::integer("visiting_batter_3_position"),
  Column::text("visiting_batter_4_id"),
  Column::text("visiting_batter_4_name"),
  Column::integer("visiting_batter_4_position"),
  Column::text("visiting_batter_5_id"),
  Column::text("visiting_batter_5_name"),
  Column::integer("visiting_batter_5_position"),
  Column::text("visiting_batter_6_id"),
  Column::text("visiting_batter_6_name"),
  Column::integer("visiting_batter_6_position"),
  Column::text("visiting_batter_7_id"),
  Column::text("visiting_batter_7_name"),
  Column::integer("visiting_batter_7_position"),
  Column::text("visiting_batter_8_id"),
  Column::text("visiting_batter_8_name"),
  Column::integer("visiting_batter_8_position"),
  Column::text("visiting_batter_9_id"),
  Column::text("visiting_batter_9_name"),
  Column::integer("visiting_batter_9_position"),
  Column::text("home_batter_1_id"),
  Column::text("home_batter_1_name"),
  Column::integer("home_batter_1_position"),
  Column::text("home_batter_2_id"),
  Column::text("home_batter_2_name"),
  Column::integer("home_batter_2_position"),
  Column::text("home_batter_3_id"),
  Column::text("home_batter_3_name"),
  Column::integer("home_batter_3_position"),
  Column::text("home_batter_4_id"),
  Column::text("home_batter_4_name"),
  Column::integer("home_batter_4_position"),
  Column::text("home_batter_5_id"),
  Column::text("home_batter_5_name"),
  Column::integer("home_batter_5_position"),
  Column::text("home_batter_6_id"),
  Column::text("home_batter_6_name"),
  Column::integer("home_batter_6_position"),
  Column::text("home_batter_7_id"),
  Column::text("home_batter_7_name"),
  Column::integer("home_batter_7_position"),
  Column::text("home_batter_8_id"),
  Column::text("home_batter_8_name"),
  Column::integer("home_batter_8_position"),
  Column::text("home_batter_9_id"),
  Column::text("home_batter_9_name"),
  Column::integer("home_batter_9_position"),
  Column::text("additional_info"),
  Column::text("acquisition_info"),
  Column::text("game_type"),
];

// ─── Plays ───────────────────────────────────────────────────────────────────

pub const PLAYS: TableSchema = TableSchema {
  name:         "plays",
  columns:      PLAYS_COLUMNS,
  conflict_key: &["gid", "pn"],
  policy:       ConflictPolicy::Ignore,
};

/// Retrosheet `plays.csv` columns. `gid` is the game id and `pn` the play
/// number within the game.
pub const PLAYS_COLUMNS: &[Column] = &[
  Column::text("gid"),
  Column::text("event"),
  Column::integer("inning"),
  Column::integer("top_bot"),
  Column::integer("vis_home"),
  Column::text("site"),
  Column::text("batteam"),
  Column::text("pitteam"),
  Column::integer("score_v"),
  Column::integer("score_h"),
  Column::text("batter"),
  Column::text("pitcher"),
  Column::integer("lp"),
  Column::integer("bat_f"),
  Column::text("bathand"),
  Column::text("pithand"),
  Column::text("count"),
  Column::text("pitches"),
  Column::integer("nump"),
  Column::integer("pa"),
  Column::integer("ab"),
  Column::integer("single"),
  Column::integer("double"),
  Column::integer("triple"),
  Column::integer("hr"),
  Column::integer("sh"),
  Column::integer("sf"),
  Column::integer("hbp"),
  Column::integer("walk"),
  Column::integer("iw"),
  Column::integer("k"),
  Column::integer("xi"),
  Column::integer("oth"),
  Column::integer("othout"),
  Column::integer("noout"),
  Column::integer("bip"),
  Column::integer("bunt"),
  Column::integer("ground"),
  Column::integer("fly"),
  Column::integer("line"),
  Column::integer("gdp"),
  Column::integer("othdp"),
  Column::integer("tp"),
  Column::integer("fle"),
  Column::integer("wp"),
  Column::integer("pb"),
  Column::integer("bk"),
  Column::integer("oa"),
  Column::integer("di"),
  Column::integer("sb2"),
  Column::integer("sb3"),
  Column::integer("sbh"),
  Column::integer("cs2"),
  Column::integer("cs3"),
  Column::integer("csh"),
  Column::integer("pko1"),
  Column::integer("pko2"),
  Column::integer("pko3"),
  Column::integer("k_safe"),
  Column::integer("e1"),
  Column::integer("e2"),
  Column::integer("e3"),
  Column::integer("e4"),
  Column::integer("e5"),
  Column::integer("e6"),
  Column::integer("e7"),
  Column::integer("e8"),
  Column::integer("e9"),
  Column::integer("outs_pre"),
  Column::integer("outs_post"),
  Column::text("br1_pre"),
  Column::text("br2_pre"),
  Column::text("br3_pre"),
  Column::text("br1_post"),
  Column::text("br2_post"),
  Column::text("br3_post"),
  Column::text("run_b"),
  Column::text("run1"),
  Column::text("run2"),
  Column::text("run3"),
  Column::text("prun1"),
  Column::text("prun2"),
  Column::text("prun3"),
  Column::integer("runs"),
  Column::integer("rbi"),
  Column::integer("er"),
  Column::integer("tur"),
  Column::text("f2"),
  Column::text("f3"),
  Column::text("f4"),
  Column::text("f5"),
  Column::text("f6"),
  Column::text("f7"),
  Column::text("f8"),
  Column::text("f9"),
  Column::integer("po0"),
  Column::integer("po1"),
  Column::integer("po2"),
  Column::integer("po3"),
  Column::integer("po4"),
  Column::integer("po5"),
  Column::integer("po6"),
  Column::integer("po7"),
  Column::integer("po8"),
  Column::integer("po9"),
  Column::integer("a1"),
  Column::integer("a2"),
  Column::integer("a3"),
  Column::integer("a4"),
  Column::integer("a5"),
  Column::integer("a6"),
  Column::integer("a7"),
  Column::integer("a8"),
  Column::integer("a9"),
  Column::integer("batout1"),
  Column::integer("batout2"),
  Column::integer("batout3"),
  Column::integer("brout_b"),
  Column::integer("brout1"),
  Column::integer("brout2"),
  Column::integer("brout3"),
  Column::integer("firstf"),
  Column::text("loc"),
  Column::text("hittype"),
  Column::integer("dpopp"),
  Column::integer("pivot"),
  Column::integer("pn"),
  Column::text("umphome"),
  Column::text("ump1b"),
  Column::text("ump2b"),
  Column::text("ump3b"),
  Column::text("umplf"),
  Column::text("umprf"),
  Column::text("date"),
  Column::text("gametype"),
  Column::text("pbp"),
];

// ─── Ejections ───────────────────────────────────────────────────────────────

pub const EJECTIONS: TableSchema = TableSchema {
  name:         "ejections",
  columns:      &[
    Column::text("game_id"),
    Column::text("date"),
    Column::integer("game_number"),
    Column::text("ejectee_id"),
    Column::text("ejectee_name"),
    Column::text("team"),
    Column::text("role"),
    Column::text("umpire_id"),
    Column::text("umpire_name"),
    Column::integer("inning"),
    Column::text("reason"),
  ],
  conflict_key: &["game_id", "ejectee_id"],
  policy:       ConflictPolicy::Ignore,
};

// ─── Reference constants ─────────────────────────────────────────────────────

pub const WOBA_CONSTANTS: TableSchema = TableSchema {
  name:         "woba_constants",
  columns:      &[
    Column::integer("season"),
    Column::real("woba"),
    Column::real("woba_scale"),
    Column::real("w_bb"),
    Column::real("w_hbp"),
    Column::real("w_1b"),
    Column::real("w_2b"),
    Column::real("w_3b"),
    Column::real("w_hr"),
    Column::real("run_sb"),
    Column::real("run_cs"),
    Column::real("r_pa"),
    Column::real("r_w"),
    Column::real("c_fip"),
  ],
  conflict_key: &["season"],
  policy:       ConflictPolicy::UpdateAll,
};

pub const PARK_FACTORS: TableSchema = TableSchema {
  name:         "park_factors",
  columns:      &[
    Column::integer("season"),
    Column::text("team_id"),
    Column::text("park_id"),
    Column::text("league"),
    Column::integer("basic_5yr"),
    Column::integer("basic_3yr"),
    Column::integer("basic_1yr"),
    Column::integer("single"),
    Column::integer("double"),
    Column::integer("triple"),
    Column::integer("home_run"),
    Column::integer("strikeout"),
    Column::integer("walk"),
    Column::integer("ground_ball"),
    Column::integer("fly_ball"),
    Column::integer("line_drive"),
    Column::integer("infield_fly"),
    Column::integer("fip"),
  ],
  conflict_key: &["season", "team_id"],
  policy:       ConflictPolicy::UpdateAll,
};

// ─── Win expectancy ──────────────────────────────────────────────────────────

/// Rebuilt wholesale by the win-expectancy builder, never merged; the policy
/// is only consulted if someone loads it through the bulk loader.
pub const WIN_EXPECTANCY: TableSchema = TableSchema {
  name:         "win_expectancy",
  columns:      &[
    Column::integer("era_start"),
    Column::integer("era_end"),
    Column::integer("inning"),
    Column::integer("is_bottom"),
    Column::integer("outs"),
    Column::integer("runners"),
    Column::integer("score_diff"),
    Column::real("win_probability"),
    Column::integer("sample_size"),
  ],
  conflict_key: &[
    "era_start", "era_end", "inning", "is_bottom", "outs", "runners", "score_diff",
  ],
  policy:       ConflictPolicy::UpdateAll,
};

/// Every table written through the loader, for schema checks.
pub const ALL_TABLES: &[&TableSchema] =
  &[&GAMES, &PLAYS, &EJECTIONS, &WOBA_CONSTANTS, &PARK_FACTORS, &WIN_EXPECTANCY];
