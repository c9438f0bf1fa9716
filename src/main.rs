use std::{convert::TryFrom, process::ExitCode};

use clap::Parser;
use log::{error, info, warn};

use aggregate_planning::config::{Args, Config};

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = match Config::try_from(args) {
        Ok(config) => config,
        Err(err) => {
            error!("{}", err);
            return ExitCode::from(2);
        }
    };

    match aggregate_planning::run(&config) {
        Ok(outcome) if outcome.result.status.has_solution() => {
            info!(
                "Profit = {:?}. Report written to {}",
                outcome.result.objective,
                outcome.report_dir.display()
            );
            ExitCode::SUCCESS
        }
        Ok(outcome) => {
            warn!(
                "No plan found ({}). Report written to {}",
                outcome.result.status,
                outcome.report_dir.display()
            );
            ExitCode::FAILURE
        }
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
