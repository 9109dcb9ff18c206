use crate::Config;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "reports", version, about = "Budget and election reports from CSV files")]
pub struct Cli {
    /// Debug logging on stderr (RUST_LOG wins if set)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Profit/loss summary of a monthly ledger
    Bank(BankArgs),
    /// Vote count and winner from a ballot file
    Poll(PollArgs),
}

#[derive(Debug, Args)]
pub struct BankArgs {
    /// Ledger CSV: period, profit
    #[arg(long, default_value = "Resources/budget_data.csv")]
    pub input: PathBuf,
    #[arg(long, default_value = "Analysis/pybank_output.txt")]
    pub output: PathBuf,
}

#[derive(Debug, Args)]
pub struct PollArgs {
    /// Ballot CSV: voter id, (ignored), candidate
    #[arg(long, default_value = "Resources/election_data.csv")]
    pub input: PathBuf,
    #[arg(long, default_value = "Analysis/pypoll_output.txt")]
    pub output: PathBuf,
}

impl From<BankArgs> for Config {
    fn from(args: BankArgs) -> Self {
        Config {
            input: args.input,
            output: args.output,
        }
    }
}

impl From<PollArgs> for Config {
    fn from(args: PollArgs) -> Self {
        Config {
            input: args.input,
            output: args.output,
        }
    }
}
