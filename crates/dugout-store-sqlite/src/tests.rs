//! Integration tests for `SqliteStore` against an in-memory database.

use std::{fmt::Write as _, io::Cursor, time::Duration};

use dugout_core::{
  migration::Migration,
  schema::{ALL_TABLES, ConflictPolicy, GAMES, NEGRO_LEAGUES_TAG_COLUMNS, PLAYS},
  win_expectancy::EraRange,
};
use tokio_util::sync::CancellationToken;

use crate::{COPY_BATCH_ROWS, DirMigrations, EmbeddedMigrations, Error, SqliteStore, StageMerge};

async fn bare_store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn store() -> SqliteStore {
  let s = bare_store().await;
  s.migrate(&EmbeddedMigrations).await.expect("migrate");
  s
}

fn csv(text: &str) -> Cursor<Vec<u8>> { Cursor::new(text.as_bytes().to_vec()) }

async fn table_exists(s: &SqliteStore, name: &'static str) -> bool {
  s.call(move |conn| {
    let n: i64 = conn.query_row(
      "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
      [name],
      |r| r.get(0),
    )?;
    Ok(n > 0)
  })
  .await
  .unwrap()
}

// ─── Migrations ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn migrate_is_idempotent() {
  let s = bare_store().await;

  let first = s.migrate(&EmbeddedMigrations).await.unwrap();
  assert_eq!(first, 6);

  let second = s.migrate(&EmbeddedMigrations).await.unwrap();
  assert_eq!(second, 0);

  let applied = s.applied_migrations().await.unwrap();
  assert_eq!(applied.len(), 6);
  assert_eq!(applied[0], "0001_games");
}

#[tokio::test]
async fn migrated_tables_match_descriptors() {
  let s = store().await;

  for table in ALL_TABLES {
    let name = table.name;
    let actual: Vec<(String, String)> = s
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!("PRAGMA table_info(\"{name}\")"))?;
        let cols = stmt
          .query_map([], |r| Ok((r.get(1)?, r.get(2)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(cols)
      })
      .await
      .unwrap();
    let expected: Vec<(String, String)> = table
      .columns
      .iter()
      .map(|c| (c.name.to_owned(), c.ty.sql().to_owned()))
      .collect();
    assert_eq!(actual, expected, "{name}");
  }
  assert!(table_exists(&s, "dataset_refreshes").await);
}

#[tokio::test]
async fn failing_migration_rolls_back_alone() {
  let s = bare_store().await;
  let migrations = vec![
    Migration::new("0002_broken", "CREATE TABLE b (x INTEGER); THIS IS NOT SQL;"),
    Migration::new("0001_ok", "CREATE TABLE a (x INTEGER);"),
  ];

  let err = s.migrate(&migrations).await.unwrap_err();
  assert!(
    matches!(err, Error::Migration { ref name, .. } if name == "0002_broken"),
    "{err}"
  );

  assert_eq!(s.applied_migrations().await.unwrap(), ["0001_ok"]);
  assert!(table_exists(&s, "a").await);
  assert!(!table_exists(&s, "b").await);
}

#[tokio::test]
async fn zero_migrations_is_an_error() {
  let s = bare_store().await;
  let err = s.migrate(&Vec::<Migration>::new()).await.unwrap_err();
  assert!(matches!(err, Error::NoMigrations));
}

#[tokio::test]
async fn duplicate_migration_names_are_rejected() {
  let s = bare_store().await;
  let migrations = vec![
    Migration::new("0001_a", "CREATE TABLE a (x INTEGER);"),
    Migration::new("0001_a", "CREATE TABLE b (x INTEGER);"),
  ];
  let err = s.migrate(&migrations).await.unwrap_err();
  assert!(matches!(err, Error::DuplicateMigration(ref n) if n == "0001_a"));
  assert!(!table_exists(&s, "a").await);
}

#[tokio::test]
async fn directory_migrations_apply_in_name_order() {
  let dir = tempfile::tempdir().unwrap();
  std::fs::write(
    dir.path().join("0002_b.sql"),
    "CREATE TABLE b (a_id INTEGER REFERENCES a(id));",
  )
  .unwrap();
  std::fs::write(dir.path().join("0001_a.sql"), "CREATE TABLE a (id INTEGER PRIMARY KEY);")
    .unwrap();
  std::fs::write(dir.path().join("README.txt"), "not a migration").unwrap();

  let s = bare_store().await;
  let applied = s.migrate(&DirMigrations::new(dir.path())).await.unwrap();
  assert_eq!(applied, 2);
  assert_eq!(s.applied_migrations().await.unwrap(), ["0001_a", "0002_b"]);
}

// ─── Loader ──────────────────────────────────────────────────────────────────

const PLAYS_CSV: &str = "\
gid,pn,inning,top_bot,event
BOS202304010,1,1,0,S8
BOS202304010,2,1,0,K
BOS202304010,3,1,0,\"HR/78\"
";

#[tokio::test]
async fn plays_reload_is_idempotent() {
  let s = store().await;
  let cancel = CancellationToken::new();
  let loader = StageMerge::for_schema(&PLAYS);

  let first = s.load(&cancel, csv(PLAYS_CSV), &loader).await.unwrap();
  assert_eq!(first, 3);

  let second = s.load(&cancel, csv(PLAYS_CSV), &loader).await.unwrap();
  assert_eq!(second, 0);
  assert_eq!(s.row_count(&PLAYS).await.unwrap(), 3);
}

#[tokio::test]
async fn empty_fields_load_as_null() {
  let s = store().await;
  let cancel = CancellationToken::new();
  let text = "gid,pn,event,br1_pre\nBOS202304010,1,,\n";
  s.load(&cancel, csv(text), &StageMerge::for_schema(&PLAYS))
    .await
    .unwrap();

  let (event, runner): (Option<String>, Option<String>) = s
    .call(|conn| {
      Ok(conn.query_row("SELECT event, br1_pre FROM plays", [], |r| {
        Ok((r.get(0)?, r.get(1)?))
      })?)
    })
    .await
    .unwrap();
  assert_eq!(event, None);
  assert_eq!(runner, None);
}

async fn game_row(s: &SqliteStore) -> (i64, String, Option<String>) {
  s.call(|conn| {
    Ok(conn.query_row(
      "SELECT home_score, game_type, home_team_league FROM games
       WHERE date = '19240503' AND home_team = 'CHA'",
      [],
      |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
    )?)
  })
  .await
  .unwrap()
}

#[tokio::test]
async fn games_reload_updates_only_game_type() {
  let s = store().await;
  let cancel = CancellationToken::new();
  let loader = StageMerge::for_schema(&GAMES);
  let header = "date,game_number,visiting_team,home_team,home_score,home_team_league,game_type";

  let regular = format!("{header}\n19240503,0,KCM,CHA,5,NNL,regular\n");
  assert_eq!(s.load(&cancel, csv(&regular), &loader).await.unwrap(), 1);

  let revised = format!("{header}\n19240503,0,KCM,CHA,9,ECL,postseason\n");
  assert_eq!(s.load(&cancel, csv(&revised), &loader).await.unwrap(), 1);

  assert_eq!(s.row_count(&GAMES).await.unwrap(), 1);
  let (home_score, game_type, league) = game_row(&s).await;
  assert_eq!(home_score, 5);
  assert_eq!(game_type, "postseason");
  assert_eq!(league.as_deref(), Some("NNL"));
}

#[tokio::test]
async fn explicit_policy_overrides_table_default() {
  let s = store().await;
  let cancel = CancellationToken::new();
  let loader = StageMerge::new(&GAMES, ConflictPolicy::Update(NEGRO_LEAGUES_TAG_COLUMNS));
  let header = "date,game_number,visiting_team,home_team,home_score,home_team_league,game_type";

  let first = format!("{header}\n19240503,0,KCM,CHA,5,,regular\n");
  s.load(&cancel, csv(&first), &loader).await.unwrap();
  let revised = format!("{header}\n19240503,0,KCM,CHA,9,NNL,regular\n");
  s.load(&cancel, csv(&revised), &loader).await.unwrap();

  let (home_score, _, league) = game_row(&s).await;
  assert_eq!(home_score, 5);
  assert_eq!(league.as_deref(), Some("NNL"));
}

#[tokio::test]
async fn unknown_column_leaves_destination_untouched() {
  let s = store().await;
  let cancel = CancellationToken::new();
  let loader = StageMerge::for_schema(&PLAYS);
  s.load(&cancel, csv(PLAYS_CSV), &loader).await.unwrap();

  let bad = "gid,pn,exit_velocity\nNYA202304010,1,101.2\n";
  let err = s.load(&cancel, csv(bad), &loader).await.unwrap_err();
  assert!(
    matches!(err, Error::UnknownColumn { ref column, table: "plays" } if column == "exit_velocity")
  );
  assert_eq!(s.row_count(&PLAYS).await.unwrap(), 3);
}

#[tokio::test]
async fn ragged_row_rolls_back_the_whole_load() {
  let s = store().await;
  let cancel = CancellationToken::new();
  let text = "gid,pn,event\nBOS202304010,1,S8\nBOS202304010,2,K\nBOS202304010,3\n";

  let err = s
    .load(&cancel, csv(text), &StageMerge::for_schema(&PLAYS))
    .await
    .unwrap_err();
  assert!(
    matches!(err, Error::RowShape { line: 4, expected: 3, found: 2 }),
    "{err}"
  );
  assert_eq!(s.row_count(&PLAYS).await.unwrap(), 0);
}

#[tokio::test]
async fn cancelled_load_writes_nothing() {
  let s = store().await;
  let cancel = CancellationToken::new();
  cancel.cancel();

  let err = s
    .load(&cancel, csv(PLAYS_CSV), &StageMerge::for_schema(&PLAYS))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Cancelled));
  assert_eq!(s.row_count(&PLAYS).await.unwrap(), 0);
}

fn numbered_plays(range: std::ops::Range<u64>) -> String {
  let mut text = String::from("gid,pn\n");
  for pn in range {
    writeln!(text, "BOS202304010,{pn}").unwrap();
  }
  text
}

#[tokio::test]
async fn copy_csv_streams_across_batches() {
  let s = store().await;
  let cancel = CancellationToken::new();

  let copied = s
    .copy_csv(&cancel, csv(&numbered_plays(0..COPY_BATCH_ROWS + 5)), &PLAYS)
    .await
    .unwrap();
  assert_eq!(copied, COPY_BATCH_ROWS + 5);
  assert_eq!(s.row_count(&PLAYS).await.unwrap(), COPY_BATCH_ROWS + 5);
}

#[tokio::test]
async fn copy_csv_keeps_committed_batches_on_failure() {
  let s = store().await;
  let cancel = CancellationToken::new();

  // The first batch commits; the duplicate in the second one fails it.
  let mut text = numbered_plays(0..COPY_BATCH_ROWS);
  text.push_str("BOS202304010,0\n");

  let err = s.copy_csv(&cancel, csv(&text), &PLAYS).await.unwrap_err();
  assert!(matches!(err, Error::Sqlite(_)), "{err}");
  assert_eq!(s.row_count(&PLAYS).await.unwrap(), COPY_BATCH_ROWS);
}

// ─── Refresh ledger ──────────────────────────────────────────────────────────

#[tokio::test]
async fn refresh_bookkeeping() {
  let s = store().await;
  assert!(s.refresh("plays/2023plays").await.unwrap().is_none());

  let first = s.record_refresh("plays/2023plays", 3).await.unwrap();
  assert_eq!(first.row_count, 3);

  tokio::time::sleep(Duration::from_millis(10)).await;
  s.record_refresh("gamelog/gl2023", 2430).await.unwrap();
  let second = s.record_refresh("plays/2023plays", 7).await.unwrap();

  let all = s.list_refreshes().await.unwrap();
  assert_eq!(all.len(), 2);
  let stored = &all["plays/2023plays"];
  assert_eq!(stored.row_count, 7);
  assert_eq!(stored.last_loaded_at, second.last_loaded_at);
  assert!(stored.last_loaded_at > first.last_loaded_at);

  let one = s.refresh("gamelog/gl2023").await.unwrap().unwrap();
  assert_eq!(one.row_count, 2430);
}

// ─── Win expectancy ──────────────────────────────────────────────────────────

/// Games 01-03 are home wins reaching the lead-off states of both halves of
/// the first. Games 01 and 02 also reach a second-inning state nobody else
/// does. Game 04 ends tied and must not count.
const WE_PLAYS: &str = "\
gid,pn,inning,top_bot,vis_home,outs_pre,br1_pre,br2_pre,br3_pre,score_v,score_h,runs
BOS202304010,1,1,0,0,0,,,,0,0,0
BOS202304010,2,1,1,1,0,,,,0,0,1
BOS202304010,3,2,0,0,1,smitj001,,,0,1,0
BOS202304020,1,1,0,0,0,,,,0,0,0
BOS202304020,2,1,1,1,0,,,,0,0,1
BOS202304020,3,2,0,0,1,jonea001,,,0,1,0
BOS202304030,1,1,0,0,0,,,,0,0,0
BOS202304030,2,1,1,1,0,,,,0,0,1
BOS202304030,4,1,0,0,0,,,,0,0,0
NYA202304040,1,1,0,0,0,,,,0,0,0
";

async fn we_store() -> SqliteStore {
  let s = store().await;
  let cancel = CancellationToken::new();
  s.load(&cancel, csv(WE_PLAYS), &StageMerge::for_schema(&PLAYS))
    .await
    .unwrap();
  s
}

#[tokio::test]
async fn win_expectancy_keeps_states_at_the_threshold() {
  let s = we_store().await;
  let cancel = CancellationToken::new();

  let written = s.build_win_expectancy(&cancel, 3, &[]).await.unwrap();
  assert_eq!(written, 2);

  let entries = s.win_expectancy().await.unwrap();
  assert_eq!(entries.len(), 2);
  for entry in &entries {
    assert_eq!(entry.era, EraRange::ALL);
    assert_eq!(entry.inning, 1);
    assert_eq!((entry.outs, entry.runners, entry.score_diff), (0, 0, 0));
    assert_eq!(entry.sample_size, 3);
    assert_eq!(entry.win_probability, 1.0);
  }
  assert!(!entries[0].is_bottom);
  assert!(entries[1].is_bottom);
  assert!(!entries.iter().any(|e| e.inning == 2));
}

#[tokio::test]
async fn win_expectancy_one_below_threshold_is_dropped() {
  let s = we_store().await;
  let cancel = CancellationToken::new();

  s.build_win_expectancy(&cancel, 2, &[]).await.unwrap();
  let entries = s.win_expectancy().await.unwrap();
  let second = entries
    .iter()
    .find(|e| e.inning == 2)
    .expect("second-inning state");
  assert_eq!((second.outs, second.runners, second.score_diff), (1, 1, 1));
  assert_eq!(second.sample_size, 2);

  s.build_win_expectancy(&cancel, 4, &[]).await.unwrap();
  assert!(s.win_expectancy().await.unwrap().is_empty());
}

#[tokio::test]
async fn win_expectancy_buckets_by_era() {
  let s = we_store().await;
  let cancel = CancellationToken::new();
  let eras = [EraRange::new(1920, 1948).unwrap(), EraRange::new(2020, 2029).unwrap()];

  s.build_win_expectancy(&cancel, 1, &eras).await.unwrap();
  let entries = s.win_expectancy().await.unwrap();
  assert!(!entries.is_empty());
  assert!(entries.iter().all(|e| e.era == eras[1]));
}

#[tokio::test]
async fn win_expectancy_default_threshold_and_cancellation() {
  let s = we_store().await;
  let cancel = CancellationToken::new();

  s.build_win_expectancy(&cancel, 1, &[]).await.unwrap();
  let before = s.win_expectancy().await.unwrap();
  assert!(!before.is_empty());

  let cancelled = CancellationToken::new();
  cancelled.cancel();
  let err = s.build_win_expectancy(&cancelled, 1, &[]).await.unwrap_err();
  assert!(matches!(err, Error::Cancelled));
  assert_eq!(s.win_expectancy().await.unwrap(), before);

  // Non-positive falls back to 50, which nothing here reaches.
  assert_eq!(s.build_win_expectancy(&cancel, 0, &[]).await.unwrap(), 0);
}
