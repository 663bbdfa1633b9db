//! Ordered, idempotent schema migrations recorded in a ledger table.

use std::{collections::HashSet, fs, path::PathBuf};

use chrono::Utc;
use dugout_core::migration::{Migration, MigrationSource};
use rusqlite::TransactionBehavior;
use tracing::{debug, info};

use crate::{Error, Result, SqliteStore, encode::encode_dt};

const LEDGER_DDL: &str = "
CREATE TABLE IF NOT EXISTS schema_migrations (
    name        TEXT PRIMARY KEY,
    applied_at  TEXT NOT NULL    -- RFC 3339 UTC
);
";

// ─── Providers ───────────────────────────────────────────────────────────────

const EMBEDDED: &[(&str, &str)] = &[
  ("0001_games", include_str!("../migrations/0001_games.sql")),
  ("0002_plays", include_str!("../migrations/0002_plays.sql")),
  ("0003_ejections", include_str!("../migrations/0003_ejections.sql")),
  (
    "0004_reference_constants",
    include_str!("../migrations/0004_reference_constants.sql"),
  ),
  ("0005_win_expectancy", include_str!("../migrations/0005_win_expectancy.sql")),
  (
    "0006_dataset_refreshes",
    include_str!("../migrations/0006_dataset_refreshes.sql"),
  ),
];

/// The warehouse schema compiled into this crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedMigrations;

impl MigrationSource for EmbeddedMigrations {
  fn migrations(&self) -> dugout_core::Result<Vec<Migration>> {
    Ok(
      EMBEDDED
        .iter()
        .map(|(name, sql)| Migration::new(*name, *sql))
        .collect(),
    )
  }
}

/// Every `*.sql` file directly inside a directory; the file stem is the
/// migration name.
#[derive(Debug, Clone)]
pub struct DirMigrations {
  dir: PathBuf,
}

impl DirMigrations {
  pub fn new(dir: impl Into<PathBuf>) -> Self { Self { dir: dir.into() } }
}

impl MigrationSource for DirMigrations {
  fn migrations(&self) -> dugout_core::Result<Vec<Migration>> {
    let mut out = Vec::new();
    for entry in fs::read_dir(&self.dir)? {
      let path = entry?.path();
      let is_sql = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("sql"));
      if !is_sql || !path.is_file() {
        continue;
      }
      let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
        continue;
      };
      out.push(Migration::new(name, fs::read_to_string(&path)?));
    }
    Ok(out)
  }
}

// ─── Runner ──────────────────────────────────────────────────────────────────

impl SqliteStore {
  /// Apply every migration from `source` not yet in the ledger, in name
  /// order. Returns how many were applied by this call.
  ///
  /// Each migration runs in its own `IMMEDIATE` transaction together with
  /// its ledger row, so concurrent runners apply it exactly once and a
  /// failure rolls back only the failing migration.
  pub async fn migrate(&self, source: &dyn MigrationSource) -> Result<usize> {
    let mut migrations = source.migrations()?;
    if migrations.is_empty() {
      return Err(Error::NoMigrations);
    }
    migrations.sort_by(|a, b| a.name.cmp(&b.name));

    {
      let mut seen = HashSet::new();
      if let Some(dup) = migrations.iter().find(|m| !seen.insert(m.name.as_str())) {
        return Err(Error::DuplicateMigration(dup.name.clone()));
      }
    }

    let applied = self.call(move |conn| apply_pending(conn, &migrations)).await?;
    if applied.is_empty() {
      debug!("schema is up to date");
    }
    Ok(applied.len())
  }

  /// Names of the migrations recorded in the ledger, in apply order.
  pub async fn applied_migrations(&self) -> Result<Vec<String>> {
    self
      .call(|conn| {
        conn.execute_batch(LEDGER_DDL)?;
        let mut stmt =
          conn.prepare("SELECT name FROM schema_migrations ORDER BY name")?;
        let names = stmt
          .query_map([], |r| r.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(names)
      })
      .await
  }
}

fn apply_pending(
  conn: &mut rusqlite::Connection,
  migrations: &[Migration],
) -> Result<Vec<String>> {
  conn.execute_batch(LEDGER_DDL)?;

  let mut applied = Vec::new();
  for migration in migrations {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let done: bool = tx.query_row(
      "SELECT EXISTS (SELECT 1 FROM schema_migrations WHERE name = ?1)",
      [&migration.name],
      |r| r.get(0),
    )?;
    if done {
      continue;
    }

    tx.execute_batch(&migration.content).map_err(|source| Error::Migration {
      name: migration.name.clone(),
      source,
    })?;
    tx.execute(
      "INSERT INTO schema_migrations (name, applied_at) VALUES (?1, ?2)",
      rusqlite::params![migration.name, encode_dt(Utc::now())],
    )?;
    tx.commit()?;

    info!(migration = %migration.name, "applied migration");
    applied.push(migration.name.clone());
  }
  Ok(applied)
}
