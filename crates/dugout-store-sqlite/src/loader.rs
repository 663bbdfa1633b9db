//! Bulk loading of canonical CSV into destination tables.
//!
//! [`StageMerge`] is the one loader every dataset goes through: rows are
//! streamed into a private staging table and merged into the destination in
//! the same transaction, so a load either lands completely or not at all.

use std::io::Read;

use dugout_core::schema::{ConflictPolicy, TableSchema};
use rusqlite::TransactionBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
  Error, Result, SqliteStore,
  encode::{quote_ident, quote_list},
};

/// Rows per committed batch in [`SqliteStore::copy_csv`].
pub const COPY_BATCH_ROWS: u64 = 10_000;

/// How often row-streaming loops poll the cancellation token.
const CANCEL_CHECK_ROWS: u64 = 1_024;

// ─── StageMerge ──────────────────────────────────────────────────────────────

/// A destination table together with the conflict policy applied on merge.
#[derive(Debug, Clone, Copy)]
pub struct StageMerge {
  schema: &'static TableSchema,
  policy: ConflictPolicy,
}

impl StageMerge {
  /// Load into `schema` with an explicit conflict policy.
  pub const fn new(schema: &'static TableSchema, policy: ConflictPolicy) -> Self {
    Self { schema, policy }
  }

  /// Load into `schema` with the table's default policy.
  pub const fn for_schema(schema: &'static TableSchema) -> Self {
    Self::new(schema, schema.policy)
  }

  pub fn schema(&self) -> &'static TableSchema { self.schema }

  pub fn policy(&self) -> ConflictPolicy { self.policy }

  /// Columns overwritten when a staged row hits an existing identity. Only
  /// columns present in the source are eligible.
  fn update_columns(&self, loaded: &[&'static str]) -> Vec<&'static str> {
    match self.policy {
      ConflictPolicy::Ignore => Vec::new(),
      ConflictPolicy::Update(cols) => cols
        .iter()
        .copied()
        .filter(|c| loaded.contains(c) && !self.schema.is_key(c))
        .collect(),
      ConflictPolicy::UpdateAll => loaded
        .iter()
        .copied()
        .filter(|c| !self.schema.is_key(c))
        .collect(),
    }
  }

  fn merge_sql(&self, staging: &str, loaded: &[&'static str]) -> String {
    let cols = quote_list(loaded.iter().copied());
    let key = quote_list(self.schema.conflict_key.iter().copied());
    let updates = self.update_columns(loaded);

    // `WHERE true` keeps SQLite from reading ON as a join constraint.
    let action = if updates.is_empty() {
      "DO NOTHING".to_owned()
    } else {
      let set = updates
        .iter()
        .map(|c| {
          let c = quote_ident(c);
          format!("{c} = excluded.{c}")
        })
        .collect::<Vec<_>>()
        .join(", ");
      format!("DO UPDATE SET {set}")
    };

    format!(
      "INSERT INTO main.{dest} ({cols}) SELECT {cols} FROM temp.{staging} \
       WHERE true ON CONFLICT ({key}) {action}",
      dest = quote_ident(self.schema.name),
      staging = quote_ident(staging),
    )
  }
}

// ─── Store operations ────────────────────────────────────────────────────────

impl SqliteStore {
  /// Stage `source` (headered canonical CSV) and merge it into the loader's
  /// table inside one `IMMEDIATE` transaction. Returns the rows inserted or
  /// updated by the merge.
  ///
  /// On any error, including cancellation, the destination is unchanged.
  pub async fn load<R>(
    &self,
    cancel: &CancellationToken,
    source: R,
    loader: &StageMerge,
  ) -> Result<u64>
  where
    R: Read + Send + 'static,
  {
    let loader = *loader;
    let merged = self
      .call_cancellable(cancel, move |conn, cancel| {
        stage_and_merge(conn, cancel, source, &loader)
      })
      .await?;
    info!(table = loader.schema.name, rows = merged, "load complete");
    Ok(merged)
  }

  /// Stream `source` straight into `table` in committed batches of
  /// [`COPY_BATCH_ROWS`], without staging or conflict handling.
  ///
  /// Not atomic: a failure part-way leaves earlier batches in place, and a
  /// duplicate identity is an error. Only for trusted append-only input.
  pub async fn copy_csv<R>(
    &self,
    cancel: &CancellationToken,
    source: R,
    table: &'static TableSchema,
  ) -> Result<u64>
  where
    R: Read + Send + 'static,
  {
    let copied = self
      .call_cancellable(cancel, move |conn, cancel| {
        copy_direct(conn, cancel, source, table)
      })
      .await?;
    info!(table = table.name, rows = copied, "copy complete");
    Ok(copied)
  }
}

// ─── Blocking halves ─────────────────────────────────────────────────────────

fn stage_and_merge<R: Read>(
  conn: &mut rusqlite::Connection,
  cancel: &CancellationToken,
  source: R,
  loader: &StageMerge,
) -> Result<u64> {
  let schema = loader.schema;
  let mut reader = csv_reader(source);
  let columns = resolve_header(schema, reader.headers()?, true)?;

  let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

  let staging = format!("stage_{}_{}", schema.name, Uuid::new_v4().simple());
  tx.execute_batch(&format!(
    "CREATE TEMP TABLE {} AS SELECT * FROM main.{} WHERE 0",
    quote_ident(&staging),
    quote_ident(schema.name),
  ))?;

  let target = format!("temp.{}", quote_ident(&staging));
  let staged = copy_rows(&tx, cancel, &mut reader, &target, &columns, None)?;
  if cancel.is_cancelled() {
    return Err(Error::Cancelled);
  }
  debug!(table = schema.name, staging = %staging, rows = staged, "staged");

  let merged = tx.execute(&loader.merge_sql(&staging, &columns), [])?;
  tx.execute_batch(&format!("DROP TABLE {target}"))?;
  tx.commit()?;

  Ok(merged as u64)
}

fn copy_direct<R: Read>(
  conn: &mut rusqlite::Connection,
  cancel: &CancellationToken,
  source: R,
  schema: &'static TableSchema,
) -> Result<u64> {
  let mut reader = csv_reader(source);
  let columns = resolve_header(schema, reader.headers()?, false)?;
  let target = format!("main.{}", quote_ident(schema.name));

  let mut total = 0;
  loop {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let copied = copy_rows(
      &tx,
      cancel,
      &mut reader,
      &target,
      &columns,
      Some(COPY_BATCH_ROWS),
    )?;
    tx.commit()?;
    total += copied;
    debug!(table = schema.name, rows = total, "batch committed");
    if copied < COPY_BATCH_ROWS {
      return Ok(total);
    }
  }
}

fn csv_reader<R: Read>(source: R) -> csv::Reader<R> {
  csv::ReaderBuilder::new()
    .has_headers(true)
    .flexible(true)
    .from_reader(source)
}

/// Map source header names onto destination columns.
fn resolve_header(
  schema: &'static TableSchema,
  header: &csv::StringRecord,
  require_key: bool,
) -> Result<Vec<&'static str>> {
  if header.iter().all(|h| h.trim().is_empty()) {
    return Err(Error::EmptyHeader);
  }

  let mut columns: Vec<&'static str> = Vec::with_capacity(header.len());
  for name in header.iter().map(str::trim) {
    let column = schema.column(name).ok_or_else(|| Error::UnknownColumn {
      table:  schema.name,
      column: name.to_owned(),
    })?;
    if columns.contains(&column.name) {
      return Err(Error::DuplicateColumn { column: name.to_owned() });
    }
    columns.push(column.name);
  }

  if require_key {
    if let Some(missing) =
      schema.conflict_key.iter().copied().find(|k| !columns.contains(k))
    {
      return Err(Error::MissingKeyColumn { table: schema.name, column: missing });
    }
  }
  Ok(columns)
}

/// Insert up to `limit` records through one prepared statement. Empty fields
/// become `NULL`.
fn copy_rows<R: Read>(
  conn: &rusqlite::Connection,
  cancel: &CancellationToken,
  reader: &mut csv::Reader<R>,
  target: &str,
  columns: &[&'static str],
  limit: Option<u64>,
) -> Result<u64> {
  let placeholders = vec!["?"; columns.len()].join(", ");
  let mut stmt = conn.prepare(&format!(
    "INSERT INTO {target} ({}) VALUES ({placeholders})",
    quote_list(columns.iter().copied()),
  ))?;

  let mut record = csv::StringRecord::new();
  let mut rows = 0;
  while limit.is_none_or(|max| rows < max) && reader.read_record(&mut record)? {
    if record.len() != columns.len() {
      return Err(Error::RowShape {
        line:     record.position().map_or(0, |p| p.record() + 1),
        expected: columns.len(),
        found:    record.len(),
      });
    }
    stmt.execute(rusqlite::params_from_iter(
      record.iter().map(|f| (!f.is_empty()).then_some(f)),
    ))?;
    rows += 1;
    if rows % CANCEL_CHECK_ROWS == 0 && cancel.is_cancelled() {
      return Err(Error::Cancelled);
    }
  }
  Ok(rows)
}
