use rust_decimal::Decimal;
use std::{fmt, path::PathBuf};
use thiserror::Error;

/// One row of the profit/loss ledger. Rows are expected in chronological order,
/// nothing checks it: the deltas are simply computed in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub period: String,
    pub profit: Decimal,
}

/// Month-over-month change, labelled with the period the change lands in
/// (i.e. `profit[i] - profit[i-1]` carries the label of row `i`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delta {
    pub period: String,
    pub change: Decimal,
}

/// One vote. The middle CSV column (county, precinct, whatever) is dropped on read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ballot {
    pub voter_id: String,
    pub candidate: String,
}

/// Pipeline stage an error aborted. Used to prefix diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Load,
    Integrity,
    Report,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Load => "load failed",
            Stage::Integrity => "integrity check failed",
            Stage::Report => "report failed",
        })
    }
}

/// Everything that can end a run. None of these is recoverable: the first one
/// raised aborts the pipeline and no persistent report is written.
#[derive(Error, Debug)]
pub enum Error {
    #[error("input CSV file {} not found", .0.display())]
    NotFound(PathBuf),
    #[error("line {line}: {reason}")]
    Format { line: u64, reason: String },
    #[error("cannot read input: {0}")]
    Read(#[from] csv::Error),
    #[error("amounts out of range: {0}")]
    OutOfRange(String),
    #[error("duplicate voter id {0:?}")]
    DuplicateIdentifier(String),
    #[error("not enough data: {0}")]
    EmptyDataset(&'static str),
    #[error("cannot write report to {sink}: {source}")]
    SinkWrite {
        sink: String,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn stage(&self) -> Stage {
        match self {
            Error::NotFound(_)
            | Error::Format { .. }
            | Error::Read(_)
            | Error::OutOfRange(_) => Stage::Load,
            Error::DuplicateIdentifier(_) | Error::EmptyDataset(_) => Stage::Integrity,
            Error::SinkWrite { .. } => Stage::Report,
        }
    }
}
