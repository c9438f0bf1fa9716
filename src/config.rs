//! Command line arguments and the validated configuration of a planning run.

use std::{
    convert::TryFrom,
    path::{Path, PathBuf},
    time::Duration,
};

use clap::{ArgEnum, Parser};
use derive_more::Display;
use serde::Serialize;

use crate::data::{schema::Table, Quantity};
use crate::solver::{GoodLpSolver, Solver, SolverOptions};

/// Builds and solves an aggregate production plan from planning data
#[derive(Parser, Debug, Clone)]
#[clap(name = "aggregate-planning", version)]
pub struct Args {
    /// Name of the model, also used for the report directory
    #[clap(short, long)]
    pub name: String,

    /// Planning data: a workbook or a directory with one csv file per table
    #[clap(short, long, parse(from_os_str))]
    pub data: PathBuf,

    /// Fraction of every demand that must at least be delivered
    #[clap(short = 'l', long = "letdown", default_value_t = 0.9)]
    pub let_down_tol: f64,

    /// Units of every product held at every center before the first period
    #[clap(short = 'i', long = "inventory", default_value_t = 50, allow_hyphen_values = true)]
    pub init_inventory: i64,

    /// Directory the reports are written to
    #[clap(short, long, default_value = "report", parse(from_os_str))]
    pub report_dir: PathBuf,

    /// Time limit for the solver in seconds
    #[clap(long)]
    pub time_limit: Option<f64>,

    #[clap(long, arg_enum, default_value_t = SolverChoice::Microlp)]
    pub solver: SolverChoice,
}

#[derive(ArgEnum, Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum SolverChoice {
    #[display(fmt = "microlp")]
    Microlp,
    /// Only available when built with the `gurobi` feature
    #[display(fmt = "gurobi")]
    Gurobi,
}

#[derive(Debug, Display)]
pub enum ConfigError {
    #[display(fmt = "planning data not found at {}", "_0.display()")]
    DataNotFound(PathBuf),
    #[display(fmt = "initial inventory must be non-negative, got {}", _0)]
    NegativeInventory(i64),
    #[display(fmt = "letdown tolerance must be in (0, 1], got {}", _0)]
    LetdownOutOfRange(f64),
    #[display(fmt = "model name must not be empty")]
    EmptyName,
    #[display(fmt = "time limit must be a positive number of seconds, got {}", _0)]
    InvalidTimeLimit(f64),
    #[display(fmt = "solver {} is not available in this build", _0)]
    SolverUnavailable(SolverChoice),
    /// A table without rows, or one whose ids leave an index set empty
    #[display(fmt = "table {} defines no planning data", _0)]
    EmptyTable(Table),
}

impl std::error::Error for ConfigError {}

/// What the formulation needs to know about the run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settings {
    pub name: String,
    /// Minimum fraction of the demand that must be delivered, in (0, 1]
    pub let_down_tol: f64,
    /// Inventory of every (product, center) at the end of period 0
    pub init_inventory: Quantity,
}

impl Settings {
    pub fn new(
        name: &str,
        let_down_tol: f64,
        init_inventory: i64,
    ) -> Result<Settings, ConfigError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ConfigError::EmptyName);
        }
        if !(let_down_tol > 0.0 && let_down_tol <= 1.0) {
            return Err(ConfigError::LetdownOutOfRange(let_down_tol));
        }
        if init_inventory < 0 {
            return Err(ConfigError::NegativeInventory(init_inventory));
        }

        Ok(Settings {
            name: name.to_string(),
            let_down_tol,
            init_inventory: init_inventory as Quantity,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub settings: Settings,
    pub data: PathBuf,
    pub report_dir: PathBuf,
    pub time_limit: Option<Duration>,
    pub solver: SolverChoice,
}

impl Config {
    /// The directory holding the reports of this run
    pub fn output_dir(&self) -> PathBuf {
        self.report_dir.join(&self.settings.name)
    }

    pub fn data(&self) -> &Path {
        &self.data
    }

    /// The solver backend selected for the run
    pub fn solver(&self) -> Result<Box<dyn Solver>, ConfigError> {
        let options = SolverOptions {
            time_limit: self.time_limit,
        };

        match self.solver {
            SolverChoice::Microlp => Ok(Box::new(GoodLpSolver::new(options))),
            #[cfg(feature = "gurobi")]
            SolverChoice::Gurobi => Ok(Box::new(crate::solver::GurobiSolver::new(options))),
            #[cfg(not(feature = "gurobi"))]
            SolverChoice::Gurobi => Err(ConfigError::SolverUnavailable(self.solver)),
        }
    }
}

impl TryFrom<Args> for Config {
    type Error = ConfigError;

    fn try_from(args: Args) -> Result<Self, Self::Error> {
        let settings = Settings::new(&args.name, args.let_down_tol, args.init_inventory)?;

        if !args.data.exists() {
            return Err(ConfigError::DataNotFound(args.data));
        }

        let time_limit = match args.time_limit {
            None => None,
            Some(secs) if secs.is_finite() && secs > 0.0 => Some(Duration::from_secs_f64(secs)),
            Some(secs) => return Err(ConfigError::InvalidTimeLimit(secs)),
        };

        let config = Config {
            settings,
            data: args.data,
            report_dir: args.report_dir,
            time_limit,
            solver: args.solver,
        };
        config.solver()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(data: &Path, extra: &[&str]) -> Args {
        let data = data.to_string_lossy().to_string();
        let mut argv = vec!["aggregate-planning", "-n", "plan", "-d", data.as_str()];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn defaults_are_applied() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::try_from(args(dir.path(), &[])).unwrap();

        assert_eq!(config.settings.name, "plan");
        assert_eq!(config.settings.let_down_tol, 0.9);
        assert_eq!(config.settings.init_inventory, 50);
        assert_eq!(config.report_dir, PathBuf::from("report"));
        assert_eq!(config.output_dir(), PathBuf::from("report").join("plan"));
        assert_eq!(config.time_limit, None);
        assert_eq!(config.solver, SolverChoice::Microlp);
        assert_eq!(config.solver().unwrap().name(), "microlp");
    }

    #[test]
    fn flags_are_parsed() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::try_from(args(
            dir.path(),
            &["-l", "1", "-i", "0", "-r", "out", "--time-limit", "2.5"],
        ))
        .unwrap();

        assert_eq!(config.settings.let_down_tol, 1.0);
        assert_eq!(config.settings.init_inventory, 0);
        assert_eq!(config.output_dir(), PathBuf::from("out").join("plan"));
        assert_eq!(config.time_limit, Some(Duration::from_millis(2500)));
    }

    #[test]
    fn invalid_values_fail_before_any_work() {
        let dir = tempfile::tempdir().unwrap();

        assert!(matches!(
            Config::try_from(args(dir.path(), &["-i", "-1"])),
            Err(ConfigError::NegativeInventory(-1))
        ));
        assert!(matches!(
            Config::try_from(args(dir.path(), &["-l", "0"])),
            Err(ConfigError::LetdownOutOfRange(_))
        ));
        assert!(matches!(
            Config::try_from(args(dir.path(), &["-l", "1.5"])),
            Err(ConfigError::LetdownOutOfRange(_))
        ));
        assert!(matches!(
            Config::try_from(args(dir.path(), &["--time-limit", "0"])),
            Err(ConfigError::InvalidTimeLimit(_))
        ));
        assert!(matches!(
            Config::try_from(args(&dir.path().join("missing.xlsx"), &[])),
            Err(ConfigError::DataNotFound(_))
        ));
        assert!(matches!(
            Settings::new("  ", 0.9, 0),
            Err(ConfigError::EmptyName)
        ));
    }
}
