//! [`SqliteStore`]: the connection handle every store operation hangs off.

use std::{path::Path, time::Duration};

use dugout_core::schema::TableSchema;
use tokio_util::sync::CancellationToken;

use crate::{Error, Result, encode::quote_ident};

/// Applied on every new connection. The schema itself comes from migrations.
const CONNECTION_PRAGMAS: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;
";

/// How long a writer waits for another process's `IMMEDIATE` transaction.
const BUSY_TIMEOUT: Duration = Duration::from_secs(30);

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Dugout warehouse backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. Operations
/// on one store run one at a time on the connection thread.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path`. Does not migrate.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_connection().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_connection().await?;
    Ok(store)
  }

  async fn init_connection(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(CONNECTION_PRAGMAS)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run `f` on the connection thread, surfacing its own error type.
  pub(crate) async fn call<F, R>(&self, f: F) -> Result<R>
  where
    F: FnOnce(&mut rusqlite::Connection) -> Result<R> + Send + 'static,
    R: Send + 'static,
  {
    self.conn.call(move |conn| Ok(f(conn))).await?
  }

  /// Like [`call`](Self::call), but cancelling `cancel` interrupts whatever
  /// statement is running and the result becomes [`Error::Cancelled`].
  ///
  /// `f` also receives the token so row-streaming loops can poll it between
  /// statements.
  pub(crate) async fn call_cancellable<F, R>(
    &self,
    cancel: &CancellationToken,
    f: F,
  ) -> Result<R>
  where
    F: FnOnce(&mut rusqlite::Connection, &CancellationToken) -> Result<R>
      + Send
      + 'static,
    R: Send + 'static,
  {
    if cancel.is_cancelled() {
      return Err(Error::Cancelled);
    }

    let handle = self.conn.call(|conn| Ok(conn.get_interrupt_handle())).await?;
    let watcher = {
      let cancel = cancel.clone();
      tokio::spawn(async move {
        cancel.cancelled().await;
        handle.interrupt();
      })
    };

    let token = cancel.clone();
    let result = self.call(move |conn| f(conn, &token)).await;
    watcher.abort();

    match result {
      Err(_) if cancel.is_cancelled() => Err(Error::Cancelled),
      other => other,
    }
  }

  /// Number of rows currently in `table`.
  pub async fn row_count(&self, table: &TableSchema) -> Result<u64> {
    let sql = format!("SELECT COUNT(*) FROM {}", quote_ident(table.name));
    self
      .call(move |conn| {
        let n: i64 = conn.query_row(&sql, [], |r| r.get(0))?;
        Ok(n as u64)
      })
      .await
  }
}
