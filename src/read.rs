use crate::data::{Ballot, Error, LedgerEntry};
use csv::StringRecord;
use rust_decimal::Decimal;
use std::{fs::File, path::Path};

/// Trait for doing something with a row read from a CSV file. The aggregators
/// implement it, and so does the mock storage in the tests below, which lets us
/// check what the reader produces without any business logic in the way.
pub trait RowUser<T> {
    fn use_row(&mut self, row: T) -> Result<(), Error>;
}

/// A row type buildable from a raw CSV record. Returns the reason on failure,
/// the reader adds the line number.
pub trait FromRecord: Sized {
    fn from_record(record: &StringRecord) -> Result<Self, String>;
}

/// Profit must be an optional single minus followed by digits only; no `+`,
/// no decimals, no thousands separators.
fn parse_profit(field: &str) -> Result<Decimal, String> {
    let digits = field.strip_prefix('-').unwrap_or(field);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("profit {field:?} is not a whole number"));
    }
    field
        .parse()
        .map_err(|e| format!("profit {field:?} out of range: {e}"))
}

fn field<'r>(record: &'r StringRecord, index: usize, wanted: usize) -> Result<&'r str, String> {
    record
        .get(index)
        .ok_or_else(|| format!("expected at least {wanted} fields, found {}", record.len()))
}

impl FromRecord for LedgerEntry {
    fn from_record(record: &StringRecord) -> Result<Self, String> {
        Ok(LedgerEntry {
            period: field(record, 0, 2)?.to_owned(),
            profit: parse_profit(field(record, 1, 2)?)?,
        })
    }
}

impl FromRecord for Ballot {
    fn from_record(record: &StringRecord) -> Result<Self, String> {
        Ok(Ballot {
            voter_id: field(record, 0, 3)?.to_owned(),
            candidate: field(record, 2, 3)?.to_owned(),
        })
    }
}

/// Opens the input, refusing early with `NotFound` so that nothing else
/// (output directory included) gets touched for a missing file.
pub fn open_input(path: &Path) -> Result<File, Error> {
    if !path.exists() {
        return Err(Error::NotFound(path.to_owned()));
    }
    File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::NotFound(path.to_owned()),
        _ => Error::Read(e.into()),
    })
}

/// Simple CSV importer. The first row is always a header and is skipped, rows
/// are handed over one by one as they're parsed. The first bad row aborts the
/// whole load. Blank lines are skipped by the csv reader, they count as neither
/// rows nor errors. Returns the number of rows used.
pub fn read_rows<R: std::io::Read, T: FromRecord, U: RowUser<T>>(
    reader: R,
    user: &mut U,
) -> Result<u64, Error> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut record = StringRecord::new();
    let mut rows = 0;
    while rdr.read_record(&mut record)? {
        let line = record.position().map_or(0, |p| p.line());
        let row = T::from_record(&record).map_err(|reason| Error::Format { line, reason })?;
        user.use_row(row)?;
        rows += 1;
    }
    tracing::debug!(rows, "input read");
    Ok(rows)
}
