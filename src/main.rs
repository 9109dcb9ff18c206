use clap::Parser;
use reports::{
    config::{Cli, Command},
    logging, Budget, Config, Election,
};
use std::process::ExitCode;

fn main() -> Result<ExitCode, anyhow::Error> {
    let cli = Cli::parse();
    logging::init(cli.verbose)?;

    let stdout = std::io::stdout().lock();
    let result = match cli.command {
        Command::Bank(args) => reports::run::<Budget, _>(&Config::from(args), stdout),
        Command::Poll(args) => reports::run::<Election, _>(&Config::from(args), stdout),
    };
    match result {
        Ok(_) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            tracing::error!(stage = ?e.stage(), "{e}");
            // The diagnostic goes where the report would have gone.
            println!("{}: {e}", e.stage());
            Ok(ExitCode::FAILURE)
        }
    }
}
