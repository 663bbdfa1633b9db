//! Empirical win expectancy aggregated from the `plays` table.
//!
//! A game state is `(inning, half, outs, runners on base, score differential)`
//! as it stood before a play. For every era bucket the builder counts the
//! games that passed through each state and the share of them the home team
//! went on to win. Final scores are reconstructed from the plays themselves;
//! games that end tied carry no outcome and are skipped.

use dugout_core::win_expectancy::{
  EraRange, SCORE_DIFF_CAP, WinExpectancyEntry, effective_min_sample_size,
};
use rusqlite::TransactionBehavior;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::{Error, Result, SqliteStore};

/// The rebuild statement for `eras` buckets. Era bounds bind first, then the
/// score-differential cap, then the minimum sample size.
fn aggregate_sql(eras: usize) -> String {
  let values = (0..eras)
    .map(|i| format!("(?{}, ?{})", 2 * i + 1, 2 * i + 2))
    .collect::<Vec<_>>()
    .join(", ");
  let cap = 2 * eras + 1;
  let min = 2 * eras + 2;

  format!(
    "INSERT INTO win_expectancy (
       era_start, era_end, inning, is_bottom, outs, runners, score_diff,
       win_probability, sample_size
     )
     WITH eras (era_start, era_end) AS (VALUES {values}),
     finals AS (
       SELECT gid,
              MAX(score_h + CASE WHEN vis_home = 1 THEN COALESCE(runs, 0) ELSE 0 END)
                AS home_final,
              MAX(score_v + CASE WHEN vis_home = 0 THEN COALESCE(runs, 0) ELSE 0 END)
                AS visiting_final
       FROM plays
       WHERE score_h IS NOT NULL AND score_v IS NOT NULL
       GROUP BY gid
     ),
     states AS (
       SELECT DISTINCT
              gid,
              CAST(substr(gid, 4, 4) AS INTEGER) AS season,
              inning,
              top_bot AS is_bottom,
              outs_pre AS outs,
              (CASE WHEN COALESCE(br1_pre, '') <> '' THEN 1 ELSE 0 END)
                + (CASE WHEN COALESCE(br2_pre, '') <> '' THEN 2 ELSE 0 END)
                + (CASE WHEN COALESCE(br3_pre, '') <> '' THEN 4 ELSE 0 END)
                AS runners,
              MAX(-?{cap}, MIN(?{cap}, score_h - score_v)) AS score_diff
       FROM plays
       WHERE inning IS NOT NULL
         AND top_bot IN (0, 1)
         AND outs_pre BETWEEN 0 AND 2
         AND score_h IS NOT NULL
         AND score_v IS NOT NULL
     )
     SELECT e.era_start, e.era_end,
            s.inning, s.is_bottom, s.outs, s.runners, s.score_diff,
            AVG(CASE WHEN f.home_final > f.visiting_final THEN 1.0 ELSE 0.0 END),
            COUNT(*)
     FROM states s
     JOIN finals f ON f.gid = s.gid
     JOIN eras e ON s.season BETWEEN e.era_start AND e.era_end
     WHERE f.home_final <> f.visiting_final
     GROUP BY e.era_start, e.era_end,
              s.inning, s.is_bottom, s.outs, s.runners, s.score_diff
     HAVING COUNT(*) >= ?{min}"
  )
}

/// Swap the table contents inside one `IMMEDIATE` transaction. The token is
/// checked on both sides of the aggregation; an interrupt only reaches a
/// statement that is already running.
fn rebuild(
  conn: &mut rusqlite::Connection,
  cancel: &CancellationToken,
  sql: &str,
  params: Vec<i64>,
) -> Result<u64> {
  if cancel.is_cancelled() {
    return Err(Error::Cancelled);
  }
  let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
  tx.execute("DELETE FROM win_expectancy", [])?;
  let written = tx.execute(sql, rusqlite::params_from_iter(params))?;
  if cancel.is_cancelled() {
    return Err(Error::Cancelled);
  }
  tx.commit()?;
  Ok(written as u64)
}

impl SqliteStore {
  /// Replace the `win_expectancy` table with a fresh aggregation over
  /// `plays`. Returns the number of states written.
  ///
  /// A non-positive `min_sample_size` falls back to the default; an empty
  /// `eras` slice means one all-time era. Cancelling interrupts the query
  /// and leaves the previous table intact.
  pub async fn build_win_expectancy(
    &self,
    cancel: &CancellationToken,
    min_sample_size: i64,
    eras: &[EraRange],
  ) -> Result<u64> {
    let min = effective_min_sample_size(min_sample_size);
    let mut unique: Vec<EraRange> = Vec::with_capacity(eras.len().max(1));
    for era in eras {
      if !unique.contains(era) {
        unique.push(*era);
      }
    }
    let eras = if unique.is_empty() { vec![EraRange::ALL] } else { unique };

    let mut params: Vec<i64> = eras
      .iter()
      .flat_map(|e| [i64::from(e.start), i64::from(e.end)])
      .collect();
    params.push(SCORE_DIFF_CAP);
    params.push(min);
    let sql = aggregate_sql(eras.len());

    let written = self
      .call_cancellable(cancel, move |conn, cancel| rebuild(conn, cancel, &sql, params))
      .await?;

    info!(states = written, eras = eras.len(), min_sample_size = min, "win expectancy rebuilt");
    Ok(written)
  }

  /// The current contents of the win-expectancy table, ordered by state.
  pub async fn win_expectancy(&self) -> Result<Vec<WinExpectancyEntry>> {
    self
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT era_start, era_end, inning, is_bottom, outs, runners,
                  score_diff, win_probability, sample_size
           FROM win_expectancy
           ORDER BY era_start, era_end, inning, is_bottom, outs, runners, score_diff",
        )?;
        let entries = stmt
          .query_map([], |r| {
            Ok(WinExpectancyEntry {
              era:             EraRange { start: r.get(0)?, end: r.get(1)? },
              inning:          r.get(2)?,
              is_bottom:       r.get(3)?,
              outs:            r.get(4)?,
              runners:         r.get(5)?,
              score_diff:      r.get(6)?,
              win_probability: r.get(7)?,
              sample_size:     r.get(8)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
      })
      .await
  }
}
