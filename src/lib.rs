pub mod compute;
pub mod config;
pub mod data;
pub mod logging;
pub mod read;
pub mod write;

use read::RowUser;
use std::{io::Write, path::PathBuf};

pub use compute::{Analysis, Budget, Election};
pub use data::{Error, Stage};
pub use write::Report;

/// Where a run reads from and writes to. Path defaults live in the CLI, the
/// pipeline only sees what it's given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub input: PathBuf,
    pub output: PathBuf,
}

/// Load and aggregate only; no output of any kind. This is where every data
/// problem (missing file, bad row, duplicate ballot, too little data) surfaces.
pub fn analyse<A: Analysis + RowUser<A::Row>>(config: &Config) -> Result<Report, Error> {
    let _span = tracing::info_span!("analyse", input = %config.input.display()).entered();
    let file = read::open_input(&config.input)?;
    let mut analysis = A::default();
    let rows = read::read_rows::<_, A::Row, A>(std::io::BufReader::new(file), &mut analysis)?;
    tracing::info!(rows, "input loaded");
    Ok(analysis.finish()?.into())
}

/// Full run: analyse, then the same text to `display` and to `config.output`.
/// The dataset is validated entirely before either sink sees a byte. If the
/// file write fails the display output stays as it is.
pub fn run<A, W>(config: &Config, display: W) -> Result<Report, Error>
where
    A: Analysis + RowUser<A::Row>,
    W: Write,
{
    let report = analyse::<A>(config)?;
    write::write_report(display, &report)?;
    write::persist_report(&config.output, &report)?;
    Ok(report)
}
