//! Reader/writer configuration shared by every transform.

use std::io::{Read, Write};

use csv::{ReaderBuilder, StringRecord, Terminator, Writer, WriterBuilder};

use crate::{Error, Result};

/// Canonical output: LF line endings, quoting only where RFC 4180 needs it.
pub(crate) fn canonical_writer<W: Write>(output: W) -> Writer<W> {
  WriterBuilder::new()
    .terminator(Terminator::Any(b'\n'))
    .quote_style(csv::QuoteStyle::Necessary)
    .from_writer(output)
}

/// A reader that tolerates stray quotes and ragged rows; each transform checks
/// field counts itself so the error carries the line number.
pub(crate) fn lenient_reader<R: Read>(input: R, has_headers: bool) -> csv::Reader<R> {
  ReaderBuilder::new()
    .has_headers(has_headers)
    .flexible(true)
    .from_reader(input)
}

/// One-based row number of `record` in its file, header included.
///
/// Counted from records rather than the reader's line tracking, which lags
/// by one per row on CRLF input.
pub(crate) fn line_of(record: &StringRecord) -> u64 {
  record.position().map_or(0, |p| p.record() + 1)
}

pub(crate) fn expect_len(record: &StringRecord, expected: usize) -> Result<()> {
  if record.len() == expected {
    Ok(())
  } else {
    Err(Error::RowShape { line: line_of(record), expected, found: record.len() })
  }
}

// ─── Header lookup ───────────────────────────────────────────────────────────

/// Case-insensitive column lookup over a source header.
pub(crate) struct HeaderIndex {
  names: Vec<String>,
}

impl HeaderIndex {
  pub(crate) fn new(header: &StringRecord) -> Result<Self> {
    if header.is_empty() || header.iter().all(|h| h.trim().is_empty()) {
      return Err(Error::EmptyHeader);
    }
    Ok(Self {
      names: header.iter().map(|h| h.trim().to_ascii_lowercase()).collect(),
    })
  }

  pub(crate) fn len(&self) -> usize { self.names.len() }

  pub(crate) fn optional(&self, name: &str) -> Option<usize> {
    self.names.iter().position(|n| n.eq_ignore_ascii_case(name))
  }

  pub(crate) fn require(&self, name: &str) -> Result<usize> {
    self.optional(name).ok_or_else(|| Error::MissingColumn(name.to_owned()))
  }
}

/// Field `idx` of `record`, or empty when the column is absent.
pub(crate) fn field<'r>(record: &'r StringRecord, idx: Option<usize>) -> &'r str {
  idx.and_then(|i| record.get(i)).map_or("", str::trim)
}

/// Null out the placeholder spellings used for unknown numeric values:
/// `unknown`, `-1`, and bounds such as `<100` or `>=5000`.
pub(crate) fn clean_numeric(value: &str) -> &str {
  let v = value.trim();
  if v.eq_ignore_ascii_case("unknown")
    || v == "-1"
    || v.starts_with(['<', '>', '=', '~'])
  {
    ""
  } else {
    v
  }
}
