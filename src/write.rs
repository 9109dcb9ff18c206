use crate::{
    compute::{BudgetSummary, ElectionSummary},
    data::Error,
};
use rust_decimal::{Decimal, RoundingStrategy};
use std::{fmt, io::Write, path::Path};

pub const REPORT_WIDTH: usize = 55;

/// Rendered report: a title and its body lines, framed by separators. Built
/// once from a summary, then only ever displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    title: &'static str,
    lines: Vec<String>,
}

/// Centers `text` in `width` columns. The odd padding column goes on the left
/// when both the margin and the width are odd. Trailing padding is kept so
/// every title line is exactly `width` wide.
fn center(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len >= width {
        return text.to_owned();
    }
    let margin = width - len;
    let left = margin / 2 + (margin & width & 1);
    format!("{:left$}{text}{:right$}", "", "", right = margin - left)
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// `1234567` -> `1,234,567`
pub fn format_count(n: u64) -> String {
    group_thousands(&n.to_string())
}

/// Dollars with two decimals and thousands separators. The sign goes after the
/// dollar sign, e.g. `$-1,825,558.00`. Midpoints round away from zero, and a
/// negative amount keeps its sign even when it rounds to zero (`$-0.00`).
pub fn format_money(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let sign = if amount.is_sign_negative() && !amount.is_zero() {
        "-"
    } else {
        ""
    };
    let text = format!("{:.2}", rounded.abs());
    let (int, frac) = text.split_once('.').unwrap_or((text.as_str(), "00"));
    format!("${sign}{}.{frac}", group_thousands(int))
}

impl From<BudgetSummary> for Report {
    fn from(summary: BudgetSummary) -> Self {
        Report {
            title: "Financial Analysis",
            lines: vec![
                format!("Total Months: {}", summary.total_months),
                format!("Total Profit/Loss: {}", format_money(summary.total_profit)),
                format!("Average Change: {}", format_money(summary.average_change)),
                format!(
                    "Greatest Increase in Profits: {} ({})",
                    summary.greatest_increase.period,
                    format_money(summary.greatest_increase.change)
                ),
                format!(
                    "Greatest Decrease in Profits: {} ({})",
                    summary.greatest_decrease.period,
                    format_money(summary.greatest_decrease.change)
                ),
            ],
        }
    }
}

impl From<ElectionSummary> for Report {
    fn from(summary: ElectionSummary) -> Self {
        let mut lines = vec![
            format!("Total Votes: {}", format_count(summary.total_votes)),
            String::new(),
            String::new(),
        ];
        lines.extend(summary.results.iter().map(|r| {
            format!("{}: {:.3}% ({})", r.name, r.percent, format_count(r.votes))
        }));
        lines.push(String::new());
        lines.push(String::new());
        lines.push(format!("Winner: {}", summary.winner));
        Report {
            title: "Election Results",
            lines,
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let separator = "-".repeat(REPORT_WIDTH);
        writeln!(f, "{separator}")?;
        writeln!(f, "{}", center(self.title, REPORT_WIDTH))?;
        writeln!(f, "{separator}")?;
        for line in &self.lines {
            writeln!(f, "{line}")?;
        }
        writeln!(f, "{separator}")
    }
}

/// Display sink: the report as is, to whatever the caller hands us (stdout in
/// real life).
pub fn write_report<W: Write>(mut writer: W, report: &Report) -> Result<(), Error> {
    let sink_error = |source| Error::SinkWrite {
        sink: "display".into(),
        source,
    };
    write!(writer, "{report}").map_err(sink_error)?;
    writer.flush().map_err(sink_error)
}

/// Persistent sink. Parent directories are created as needed, and the text goes
/// to a temporary file next to the target which is then renamed over it, so a
/// failure never leaves a half-written report behind.
pub fn persist_report(path: &Path, report: &Report) -> Result<(), Error> {
    let sink_error = |source| Error::SinkWrite {
        sink: path.display().to_string(),
        source,
    };
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(sink_error)?;
    let mut file = tempfile::NamedTempFile::new_in(dir).map_err(sink_error)?;
    write!(file, "{report}").map_err(sink_error)?;
    file.as_file().sync_all().map_err(sink_error)?;
    file.persist(path).map_err(|e| sink_error(e.error))?;
    tracing::info!(path = %path.display(), "report written");
    Ok(())
}
