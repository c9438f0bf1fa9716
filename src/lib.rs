pub mod config;
pub mod data;
pub mod models;
pub mod report;
pub mod solver;
pub mod utils;

use std::path::PathBuf;

use derive_more::{Display, From};
use log::info;

use crate::config::{Config, ConfigError};
use crate::data::{DataError, PlanningData};
use crate::models::{
    aggregate_planning::{Parameters, Sets},
    AggregatePlanning, ModelError, PlanResult,
};
use crate::report::{project, Report, ReportError, RunSummary};
use crate::solver::SolverError;

#[derive(Debug, Display, From)]
pub enum Error {
    #[display(fmt = "invalid configuration: {}", _0)]
    Config(ConfigError),
    #[display(fmt = "invalid planning data: {}", _0)]
    Data(DataError),
    #[display(fmt = "could not formulate model: {}", _0)]
    Model(ModelError),
    #[display(fmt = "{}", _0)]
    Solver(SolverError),
    #[display(fmt = "{}", _0)]
    Report(ReportError),
}

impl std::error::Error for Error {}

/// What a completed run produced
pub struct RunOutcome {
    pub result: PlanResult,
    pub summary: RunSummary,
    /// Where the report was written
    pub report_dir: PathBuf,
}

/// Loads the planning data, formulates and solves the model, and writes the report.
///
/// A model without a solution is not an error: its report is written with empty amounts and the
/// status is returned in the outcome.
pub fn run(config: &Config) -> Result<RunOutcome, Error> {
    let data = PlanningData::load(config.data())?;
    let sets = Sets::new(&data)?;
    let parameters = Parameters::new(&data)?;

    let solver = config.solver()?;
    let report = Report::create(&config.output_dir())?;
    let log = report.solver_log();

    let (formulation, solution) = AggregatePlanning::solve(
        &sets,
        &parameters,
        &config.settings,
        solver.as_ref(),
        Some(log.as_path()),
    )?;

    let result = PlanResult::new(&formulation, &solution);
    let summary = RunSummary::new(solver.name(), &formulation, &result);
    report.write(&project(&result), &summary)?;

    info!(
        "Run {} finished with status {}",
        config.settings.name, result.status
    );

    Ok(RunOutcome {
        result,
        summary,
        report_dir: report.dir().to_path_buf(),
    })
}
