//! The dataset refresh ledger.

use std::collections::BTreeMap;

use chrono::Utc;
use dugout_core::refresh::DatasetRefresh;
use rusqlite::OptionalExtension as _;
use tracing::debug;

use crate::{
  Result, SqliteStore,
  encode::{decode_dt, encode_dt},
};

/// Raw strings read directly from a `dataset_refreshes` row.
struct RawRefresh {
  dataset:        String,
  last_loaded_at: String,
  row_count:      i64,
}

impl RawRefresh {
  fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      dataset:        row.get(0)?,
      last_loaded_at: row.get(1)?,
      row_count:      row.get(2)?,
    })
  }

  fn into_refresh(self) -> Result<DatasetRefresh> {
    Ok(DatasetRefresh {
      dataset:        self.dataset,
      last_loaded_at: decode_dt(&self.last_loaded_at)?,
      row_count:      self.row_count,
    })
  }
}

impl SqliteStore {
  /// Upsert the ledger row for `dataset`, stamped now.
  pub async fn record_refresh(
    &self,
    dataset: &str,
    row_count: u64,
  ) -> Result<DatasetRefresh> {
    let refresh = DatasetRefresh {
      dataset:        dataset.to_owned(),
      last_loaded_at: Utc::now(),
      row_count:      i64::try_from(row_count).unwrap_or(i64::MAX),
    };

    let dataset = refresh.dataset.clone();
    let loaded_at = encode_dt(refresh.last_loaded_at);
    let rows = refresh.row_count;
    self
      .call(move |conn| {
        conn.execute(
          "INSERT INTO dataset_refreshes (dataset, last_loaded_at, row_count)
           VALUES (?1, ?2, ?3)
           ON CONFLICT (dataset) DO UPDATE SET
             last_loaded_at = excluded.last_loaded_at,
             row_count      = excluded.row_count",
          rusqlite::params![dataset, loaded_at, rows],
        )?;
        Ok(())
      })
      .await?;

    debug!(dataset = %refresh.dataset, rows = refresh.row_count, "refresh recorded");
    Ok(refresh)
  }

  /// Every ledger row, keyed by dataset name.
  pub async fn list_refreshes(&self) -> Result<BTreeMap<String, DatasetRefresh>> {
    let raws = self
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT dataset, last_loaded_at, row_count FROM dataset_refreshes",
        )?;
        let raws = stmt
          .query_map([], RawRefresh::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(raws)
      })
      .await?;

    raws
      .into_iter()
      .map(|raw| raw.into_refresh().map(|r| (r.dataset.clone(), r)))
      .collect()
  }

  /// The ledger row for one dataset, if it was ever loaded.
  pub async fn refresh(&self, dataset: &str) -> Result<Option<DatasetRefresh>> {
    let dataset = dataset.to_owned();
    let raw = self
      .call(move |conn| {
        let raw = conn
          .query_row(
            "SELECT dataset, last_loaded_at, row_count
             FROM dataset_refreshes WHERE dataset = ?1",
            [&dataset],
            RawRefresh::from_row,
          )
          .optional()?;
        Ok(raw)
      })
      .await?;

    raw.map(RawRefresh::into_refresh).transpose()
  }
}
