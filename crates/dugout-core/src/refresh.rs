//! Dataset refresh bookkeeping records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The last successful load of a named dataset.
///
/// This is a ledger for callers deciding whether to reload; nothing in the
/// pipeline refuses a load because a refresh row exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetRefresh {
  pub dataset:        String,
  pub last_loaded_at: DateTime<Utc>,
  pub row_count:      i64,
}
