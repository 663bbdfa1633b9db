//! Retrosheet ejections.
//!
//! The published header has 11 columns, but rows from some seasons carry a
//! twelfth field: the ejectee's team code is repeated right after the
//! original. Those rows are collapsed one at a time; the header is replaced
//! with the canonical column names.

use std::io::{Read, Write};

use csv::StringRecord;
use dugout_core::schema::{EJECTIONS, TableSchema};

use crate::{
  Error, RecordTransform, Result,
  csvio::{canonical_writer, expect_len, lenient_reader, line_of},
};

/// Position of the repeated team code in a 12-field row.
pub const REDUNDANT_FIELD_OFFSET: usize = 6;

#[derive(Debug, Clone, Copy, Default)]
pub struct EjectionsTransform;

impl RecordTransform for EjectionsTransform {
  fn schema(&self) -> &'static TableSchema { &EJECTIONS }

  fn transform(&self, input: &mut dyn Read, output: &mut dyn Write) -> Result<u64> {
    let canonical = EJECTIONS.columns.len();

    let mut reader = lenient_reader(input, true);
    let header = reader.headers()?.clone();
    if header.is_empty() {
      return Err(Error::EmptyHeader);
    }
    expect_len(&header, canonical)?;

    let mut writer = canonical_writer(output);
    writer.write_record(EJECTIONS.column_names())?;

    let mut record = StringRecord::new();
    let mut rows = 0u64;
    while reader.read_record(&mut record)? {
      match record.len() {
        n if n == canonical => writer.write_record(record.iter().map(str::trim))?,
        n if n == canonical + 1 => writer.write_record(
          record
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != REDUNDANT_FIELD_OFFSET)
            .map(|(_, f)| f.trim()),
        )?,
        found => {
          return Err(Error::RowShape { line: line_of(&record), expected: canonical, found });
        }
      }
      rows += 1;
    }

    writer.flush()?;
    Ok(rows)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const HEADER: &str =
    "GAMEID,DATE,DH,EJECTEE,EJECTEENAME,TEAM,JOB,UMPIRE,UMPIRENAME,INNING,REASON\n";

  fn run(input: &str) -> Result<(u64, Vec<StringRecord>)> {
    let mut out = Vec::new();
    let rows = EjectionsTransform.transform(&mut input.as_bytes(), &mut out)?;
    let mut reader = csv::Reader::from_reader(out.as_slice());
    assert_eq!(
      reader.headers().unwrap().iter().collect::<Vec<_>>(),
      EJECTIONS.column_names().collect::<Vec<_>>()
    );
    let records = reader.records().collect::<csv::Result<Vec<_>>>()?;
    Ok((rows, records))
  }

  #[test]
  fn canonical_rows_pass_through() {
    let input = format!(
      "{HEADER}NY1191404150,04/15/1914,0,mcgrj101,John McGraw,NY1,M,klemb901,Bill Klem,5,Arguing\n"
    );
    let (rows, records) = run(&input).unwrap();
    assert_eq!(rows, 1);
    assert_eq!(records[0].len(), 11);
    assert_eq!(&records[0][3], "mcgrj101");
    assert_eq!(&records[0][6], "M");
  }

  #[test]
  fn twelve_field_rows_drop_the_repeated_team() {
    let input = format!(
      "{HEADER}\
       NY1191404150,04/15/1914,0,mcgrj101,John McGraw,NY1,M,klemb901,Bill Klem,5,Arguing\n\
       BRO191405020,05/02/1914,1,wheaz101,Zack Wheat,BRO,BRO,P,rigbc901,Cy Rigler,7,Balls and strikes\n"
    );
    let (rows, records) = run(&input).unwrap();
    assert_eq!(rows, 2);
    let collapsed = &records[1];
    assert_eq!(collapsed.len(), 11);
    assert_eq!(&collapsed[5], "BRO");
    assert_eq!(&collapsed[6], "P");
    assert_eq!(&collapsed[7], "rigbc901");
    assert_eq!(&collapsed[10], "Balls and strikes");
  }

  #[test]
  fn other_field_counts_are_fatal() {
    let input = format!("{HEADER}NY1191404150,04/15/1914,0\n");
    let err = run(&input).unwrap_err();
    assert!(matches!(err, Error::RowShape { line: 2, expected: 11, found: 3 }));
  }

  #[test]
  fn bad_crlf_row_reports_its_line() {
    let input = format!(
      "{}\
       NY1191404150,04/15/1914,0,mcgrj101,John McGraw,NY1,M,klemb901,Bill Klem,5,Arguing\r\n\
       NY1191404160,04/16/1914,0,mcgrj101,John McGraw,NY1,M,klemb901,Bill Klem,3,Arguing\r\n\
       NY1191404170,04/17/1914,0\r\n",
      HEADER.replace('\n', "\r\n")
    );
    let err = run(&input).unwrap_err();
    assert!(matches!(err, Error::RowShape { line: 4, expected: 11, found: 3 }));
  }
}
