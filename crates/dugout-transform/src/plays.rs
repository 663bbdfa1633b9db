//! Retrosheet play-by-play files.
//!
//! The files are headered but mark unknown values with a bare `?` and are not
//! always quoted consistently. Reading is lenient; output is strict.

use std::io::{Read, Write};

use csv::StringRecord;
use dugout_core::schema::{PLAYS, TableSchema};

use crate::{
  Error, RecordTransform, Result,
  csvio::{canonical_writer, expect_len, lenient_reader},
};

const NULL_SENTINEL: &str = "?";

#[derive(Debug, Clone, Copy, Default)]
pub struct PlaysTransform;

impl RecordTransform for PlaysTransform {
  fn schema(&self) -> &'static TableSchema { &PLAYS }

  fn transform(&self, input: &mut dyn Read, output: &mut dyn Write) -> Result<u64> {
    let mut reader = lenient_reader(input, true);
    let header = reader.headers()?.clone();
    if header.is_empty() {
      return Err(Error::EmptyHeader);
    }

    let mut writer = canonical_writer(output);
    writer.write_record(header.iter().map(str::trim))?;

    let mut record = StringRecord::new();
    let mut rows = 0u64;
    while reader.read_record(&mut record)? {
      expect_len(&record, header.len())?;
      writer.write_record(record.iter().map(|f| {
        if f.trim() == NULL_SENTINEL { "" } else { f }
      }))?;
      rows += 1;
    }

    writer.flush()?;
    Ok(rows)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn run(input: &str) -> Result<(u64, String)> {
    let mut out = Vec::new();
    let rows = PlaysTransform.transform(&mut input.as_bytes(), &mut out)?;
    Ok((rows, String::from_utf8(out).unwrap()))
  }

  #[test]
  fn question_marks_become_empty() {
    let input = "gid,pn,event,count\r\nBOS202307010,1,S8,?\r\nBOS202307010,2,?,12\r\n";
    let (rows, out) = run(input).unwrap();
    assert_eq!(rows, 2);
    assert_eq!(out, "gid,pn,event,count\nBOS202307010,1,S8,\nBOS202307010,2,,12\n");
  }

  #[test]
  fn only_whole_field_sentinels_are_cleaned() {
    let input = "gid,pn,event\nBOS202307010,1,S8/G?\n";
    let (_, out) = run(input).unwrap();
    assert!(out.ends_with("BOS202307010,1,S8/G?\n"));
  }

  #[test]
  fn loose_quotes_are_tolerated_and_requoted() {
    let input = "gid,pn,pbp\nBOS202307010,1,\"single, to \"\"left\"\"\"\nBOS202307010,2,a\"b\n";
    let (rows, out) = run(input).unwrap();
    assert_eq!(rows, 2);

    let mut reader = csv::Reader::from_reader(out.as_bytes());
    let records: Vec<StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(&records[0][2], "single, to \"left\"");
    assert_eq!(&records[1][2], "a\"b");
  }

  #[test]
  fn ragged_row_is_rejected() {
    let input = "gid,pn,event\nBOS202307010,1\n";
    let err = run(input).unwrap_err();
    assert!(matches!(err, Error::RowShape { line: 2, expected: 3, found: 2 }));
  }

  #[test]
  fn ragged_crlf_row_reports_its_line() {
    let input = "gid,pn,event\r\nBOS202307010,1,S8\r\nBOS202307010,2,S7\r\nBOS202307010,3\r\n";
    let err = run(input).unwrap_err();
    assert!(matches!(err, Error::RowShape { line: 4, expected: 3, found: 2 }));
  }
}
