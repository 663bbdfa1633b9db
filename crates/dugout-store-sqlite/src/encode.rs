//! Conversions between domain values and their SQLite column text.
//!
//! Timestamps are stored as RFC 3339 strings; SQL identifiers are always
//! double-quoted.

use chrono::{DateTime, Utc};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Identifiers ─────────────────────────────────────────────────────────────

pub fn quote_ident(name: &str) -> String {
  format!("\"{}\"", name.replace('"', "\"\""))
}

/// `"a", "b", "c"`
pub fn quote_list<'a>(names: impl IntoIterator<Item = &'a str>) -> String {
  names.into_iter().map(quote_ident).collect::<Vec<_>>().join(", ")
}
