use crate::{
    data::{Ballot, Delta, Error, LedgerEntry},
    read::{FromRecord, RowUser},
    write::Report,
};
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};

/// One analysis = one row type, an accumulator fed row by row, and a final
/// step that either produces something reportable or rejects the whole
/// dataset. Nothing gets printed before `finish` has succeeded. Implementors
/// are also expected to be a `RowUser<Self::Row>`, the pipeline asks for both.
pub trait Analysis: Default {
    type Row: FromRecord;
    type Summary: Into<Report>;

    fn finish(self) -> Result<Self::Summary, Error>;
}

/// Running state for the profit/loss ledger.
#[derive(Debug, Default)]
pub struct Budget {
    months: u64,
    total: Decimal,
    previous: Option<Decimal>,
    changes: Vec<Delta>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetSummary {
    pub total_months: u64,
    pub total_profit: Decimal,
    pub average_change: Decimal,
    pub greatest_increase: Delta,
    pub greatest_decrease: Delta,
}

impl RowUser<LedgerEntry> for Budget {
    fn use_row(&mut self, entry: LedgerEntry) -> Result<(), Error> {
        let total = self.total.checked_add(entry.profit).ok_or_else(|| {
            Error::OutOfRange(format!("total profit overflows at {}", entry.period))
        })?;
        let change = match self.previous {
            Some(previous) => Some(entry.profit.checked_sub(previous).ok_or_else(|| {
                Error::OutOfRange(format!("change into {} overflows", entry.period))
            })?),
            None => None,
        };
        self.months += 1;
        self.total = total;
        self.previous = Some(entry.profit);
        if let Some(change) = change {
            self.changes.push(Delta {
                change,
                period: entry.period,
            });
        }
        Ok(())
    }
}

/// First delta for which `better(candidate, current)` holds strictly, so ties
/// stay with the earliest one. `Iterator::max_by` would keep the last.
fn first_extreme(
    changes: &[Delta],
    better: impl Fn(Decimal, Decimal) -> bool,
) -> Option<&Delta> {
    changes.iter().fold(None, |best: Option<&Delta>, delta| match best {
        Some(best) if !better(delta.change, best.change) => Some(best),
        _ => Some(delta),
    })
}

impl Analysis for Budget {
    type Row = LedgerEntry;
    type Summary = BudgetSummary;

    fn finish(self) -> Result<BudgetSummary, Error> {
        let (Some(increase), Some(decrease)) = (
            first_extreme(&self.changes, |a, b| a > b),
            first_extreme(&self.changes, |a, b| a < b),
        ) else {
            return Err(Error::EmptyDataset(
                "at least two ledger rows are needed to compute a change",
            ));
        };
        let sum = self
            .changes
            .iter()
            .try_fold(Decimal::ZERO, |sum, d| sum.checked_add(d.change))
            .ok_or_else(|| Error::OutOfRange("sum of changes overflows".into()))?;
        let average_change = sum / Decimal::from(self.changes.len());
        let summary = BudgetSummary {
            total_months: self.months,
            total_profit: self.total,
            average_change,
            greatest_increase: increase.clone(),
            greatest_decrease: decrease.clone(),
        };
        tracing::debug!(?summary, "ledger aggregated");
        Ok(summary)
    }
}

/// Candidate -> votes, iterated in the order candidates first showed up. The
/// order is for display only, it doesn't rank anything.
#[derive(Debug, Default)]
pub struct Tally {
    counts: Vec<(String, u64)>,
    index: HashMap<String, usize>,
}

impl Tally {
    pub fn add(&mut self, candidate: String) {
        match self.index.get(&candidate) {
            Some(&i) => self.counts[i].1 += 1,
            None => {
                self.index.insert(candidate.clone(), self.counts.len());
                self.counts.push((candidate, 1));
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(name, votes)| (name.as_str(), *votes))
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().map(|(_, votes)| votes).sum()
    }

    /// "First-seen-max" winner policy: the highest count wins, and among equal
    /// counts the candidate seen first in the input wins. Not alphabetical, not
    /// random.
    pub fn first_seen_max(&self) -> Option<(&str, u64)> {
        self.iter().fold(None, |best, (name, votes)| match best {
            Some((_, most)) if votes <= most => best,
            _ => Some((name, votes)),
        })
    }
}

/// Running state for the ballots. Every voter id is kept so uniqueness can be
/// checked once the whole file has been read.
#[derive(Debug, Default)]
pub struct Election {
    voter_ids: Vec<String>,
    tally: Tally,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CandidateResult {
    pub name: String,
    pub votes: u64,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElectionSummary {
    pub total_votes: u64,
    pub results: Vec<CandidateResult>,
    pub winner: String,
}

impl RowUser<Ballot> for Election {
    fn use_row(&mut self, ballot: Ballot) -> Result<(), Error> {
        self.voter_ids.push(ballot.voter_id);
        self.tally.add(ballot.candidate);
        Ok(())
    }
}

impl Election {
    fn first_duplicate(&self) -> Option<&str> {
        let mut seen = HashSet::with_capacity(self.voter_ids.len());
        for id in &self.voter_ids {
            if !seen.insert(id.as_str()) {
                return Some(id);
            }
        }
        None
    }
}

impl Analysis for Election {
    type Row = Ballot;
    type Summary = ElectionSummary;

    fn finish(self) -> Result<ElectionSummary, Error> {
        if let Some(id) = self.first_duplicate() {
            tracing::warn!(voter_id = id, "duplicate ballot");
            return Err(Error::DuplicateIdentifier(id.to_owned()));
        }
        let total_votes = self.tally.total();
        debug_assert_eq!(total_votes, self.voter_ids.len() as u64);
        let Some((winner, _)) = self.tally.first_seen_max() else {
            return Err(Error::EmptyDataset("no ballots to count"));
        };
        let summary = ElectionSummary {
            total_votes,
            results: self
                .tally
                .iter()
                .map(|(name, votes)| CandidateResult {
                    name: name.to_owned(),
                    votes,
                    percent: 100.0 * votes as f64 / total_votes as f64,
                })
                .collect(),
            winner: winner.to_owned(),
        };
        tracing::debug!(?summary, "ballots counted");
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        compute::{Analysis, Budget, CandidateResult, Election, Tally},
        data::{Ballot, Delta, Error, LedgerEntry},
        read::RowUser,
    };
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn budget(rows: &[(&str, Decimal)]) -> Budget {
        let mut budget = Budget::default();
        for (period, profit) in rows {
            budget
                .use_row(LedgerEntry {
                    period: period.to_string(),
                    profit: *profit,
                })
                .unwrap();
        }
        budget
    }

    fn election(rows: &[(&str, &str)]) -> Election {
        let mut election = Election::default();
        for (voter_id, candidate) in rows {
            election
                .use_row(Ballot {
                    voter_id: voter_id.to_string(),
                    candidate: candidate.to_string(),
                })
                .unwrap();
        }
        election
    }

    fn delta(period: &str, change: Decimal) -> Delta {
        Delta {
            period: period.into(),
            change,
        }
    }

    #[test]
    fn test_budget_summary() {
        let summary = budget(&[("Jan", dec!(10)), ("Feb", dec!(4)), ("Mar", dec!(7))])
            .finish()
            .unwrap();
        assert_eq!(summary.total_months, 3);
        assert_eq!(summary.total_profit, dec!(21));
        assert_eq!(summary.average_change, dec!(-1.5));
        assert_eq!(summary.greatest_increase, delta("Mar", dec!(3)));
        assert_eq!(summary.greatest_decrease, delta("Feb", dec!(-6)));
    }

    #[test]
    fn test_budget_deltas() {
        let b = budget(&[("Jan", dec!(10)), ("Feb", dec!(4)), ("Mar", dec!(7))]);
        assert_eq!(b.changes, [delta("Feb", dec!(-6)), delta("Mar", dec!(3))]);
    }

    #[test]
    fn test_budget_ties_keep_first() {
        let summary = budget(&[
            ("Jan", dec!(0)),
            ("Feb", dec!(5)),
            ("Mar", dec!(0)),
            ("Apr", dec!(5)),
            ("May", dec!(0)),
        ])
        .finish()
        .unwrap();
        assert_eq!(summary.greatest_increase, delta("Feb", dec!(5)));
        assert_eq!(summary.greatest_decrease, delta("Mar", dec!(-5)));
        assert_eq!(summary.average_change, dec!(0));
    }

    #[test]
    fn test_budget_flat() {
        let summary = budget(&[("Jan", dec!(-3)), ("Feb", dec!(-3))])
            .finish()
            .unwrap();
        assert_eq!(summary.total_profit, dec!(-6));
        assert_eq!(summary.greatest_increase, delta("Feb", dec!(0)));
        assert_eq!(summary.greatest_decrease, delta("Feb", dec!(0)));
    }

    #[test]
    fn test_budget_too_short() {
        assert!(matches!(
            Budget::default().finish(),
            Err(Error::EmptyDataset(_))
        ));
        assert!(matches!(
            budget(&[("Jan", dec!(10))]).finish(),
            Err(Error::EmptyDataset(_))
        ));
    }

    #[test]
    fn test_budget_total_overflow() {
        let mut b = budget(&[("Jan", Decimal::MAX)]);
        assert!(matches!(
            b.use_row(LedgerEntry {
                period: "Feb".into(),
                profit: Decimal::MAX,
            }),
            Err(Error::OutOfRange(_))
        ));
        // the failed row left nothing behind
        assert_eq!(b.months, 1);
        assert_eq!(b.total, Decimal::MAX);
    }

    #[test]
    fn test_budget_change_overflow() {
        let mut b = budget(&[("Jan", Decimal::MAX)]);
        match b.use_row(LedgerEntry {
            period: "Feb".into(),
            profit: Decimal::MIN,
        }) {
            Err(Error::OutOfRange(what)) => assert!(what.contains("Feb")),
            other => panic!("unexpected {other:?}"),
        }
        assert!(b.changes.is_empty());
        assert_eq!(b.total, Decimal::MAX);
    }

    #[test]
    fn test_budget_change_sum_overflow() {
        // each change fits, their running sum doesn't
        let x = Decimal::MAX / dec!(5) * dec!(3);
        let b = budget(&[("Jan", -x), ("Feb", dec!(0)), ("Mar", x)]);
        assert_eq!(b.total, dec!(0));
        assert!(matches!(b.finish(), Err(Error::OutOfRange(_))));
    }

    #[test]
    fn test_election_summary() {
        let summary = election(&[("V1", "A"), ("V2", "B"), ("V3", "A")])
            .finish()
            .unwrap();
        assert_eq!(summary.total_votes, 3);
        assert_eq!(summary.winner, "A");
        let names: Vec<_> = summary.results.iter().map(|r| (r.name.as_str(), r.votes)).collect();
        assert_eq!(names, [("A", 2), ("B", 1)]);
        assert!((summary.results[0].percent - 66.666_666).abs() < 1e-3);
        assert!((summary.results[1].percent - 33.333_333).abs() < 1e-3);
        let sum: f64 = summary.results.iter().map(|r| r.percent).sum();
        assert!((sum - 100.0).abs() < 1e-9);
        assert_eq!(
            summary.results.iter().map(|r| r.votes).sum::<u64>(),
            summary.total_votes
        );
    }

    #[test]
    fn test_election_first_seen_order() {
        let summary = election(&[("1", "Zed"), ("2", "Amy"), ("3", "Amy"), ("4", "Bob")])
            .finish()
            .unwrap();
        assert_eq!(
            summary.results,
            [
                CandidateResult {
                    name: "Zed".into(),
                    votes: 1,
                    percent: 25.0
                },
                CandidateResult {
                    name: "Amy".into(),
                    votes: 2,
                    percent: 50.0
                },
                CandidateResult {
                    name: "Bob".into(),
                    votes: 1,
                    percent: 25.0
                },
            ]
        );
    }

    #[test]
    fn test_election_tie_first_seen_max() {
        let summary = election(&[("1", "B"), ("2", "A"), ("3", "A"), ("4", "B")])
            .finish()
            .unwrap();
        assert_eq!(summary.winner, "B");
    }

    #[test]
    fn test_election_duplicate() {
        match election(&[("V001", "A"), ("V002", "B"), ("V001", "B")]).finish() {
            Err(Error::DuplicateIdentifier(id)) => assert_eq!(id, "V001"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_election_empty() {
        assert!(matches!(
            Election::default().finish(),
            Err(Error::EmptyDataset(_))
        ));
    }

    #[test]
    fn test_tally() {
        let mut tally = Tally::default();
        assert_eq!(tally.first_seen_max(), None);
        for name in ["x", "y", "y", "x", "z"] {
            tally.add(name.into());
        }
        assert_eq!(tally.total(), 5);
        assert_eq!(tally.iter().collect::<Vec<_>>(), [("x", 2), ("y", 2), ("z", 1)]);
        assert_eq!(tally.first_seen_max(), Some(("x", 2)));
    }
}
