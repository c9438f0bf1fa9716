//! Solver backends consuming a [`CompiledModel`].
//!
//! A backend reports the outcome of the optimization as a [`Status`]. An infeasible or unbounded model
//! is a valid outcome and is returned as such; only failures of the backend itself are errors.

pub mod microlp;
#[cfg(feature = "gurobi")]
pub mod gurobi;

use std::{
    fmt::Display,
    fs::File,
    io::{BufWriter, Write},
    path::Path,
    time::Duration,
};

use derive_more::{Display, From};
use serde::Serialize;

use crate::models::linear::{CompiledModel, Var};

pub use self::microlp::GoodLpSolver;
#[cfg(feature = "gurobi")]
pub use self::gurobi::GurobiSolver;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
pub enum Status {
    /// Proven optimal solution
    Optimal,
    /// A solution exists, but it was not proven optimal (e.g. the time limit was hit)
    Feasible,
    Infeasible,
    Unbounded,
    /// The solver proved that there is no optimum without deciding whether the model is infeasible
    /// or unbounded
    InfeasibleOrUnbounded,
    /// The solver stopped without finding any solution
    Interrupted,
}

impl Status {
    pub fn has_solution(&self) -> bool {
        matches!(self, Status::Optimal | Status::Feasible)
    }
}

/// The outcome of solving a model
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    status: Status,
    objective: Option<f64>,
    values: Option<Vec<f64>>,
}

impl Solution {
    pub fn new(status: Status, objective: f64, values: Vec<f64>) -> Solution {
        Solution {
            status,
            objective: Some(objective),
            values: Some(values),
        }
    }

    /// An outcome without any variable values
    pub fn without_values(status: Status) -> Solution {
        Solution {
            status,
            objective: None,
            values: None,
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn objective(&self) -> Option<f64> {
        self.objective
    }

    /// The value of every variable, indexed by [`Var::index`]
    pub fn values(&self) -> Option<&[f64]> {
        self.values.as_deref()
    }

    pub fn value(&self, var: Var) -> Option<f64> {
        self.values
            .as_ref()
            .and_then(|values| values.get(var.index()).copied())
    }
}

#[derive(Debug, Display, From)]
pub enum SolverError {
    #[display(fmt = "solver backend failed: {}", _0)]
    #[from(ignore)]
    Backend(String),
    #[display(fmt = "could not write solver log: {}", _0)]
    Io(std::io::Error),
    #[cfg(feature = "gurobi")]
    #[display(fmt = "gurobi error: {}", _0)]
    Gurobi(grb::Error),
}

impl std::error::Error for SolverError {}

#[derive(Debug, Clone, Default)]
pub struct SolverOptions {
    /// Wall clock limit for a single solve
    pub time_limit: Option<Duration>,
}

pub trait Solver {
    fn name(&self) -> &'static str;

    /// Solve `model`, writing the run trace to `log` if given.
    fn solve(&self, model: &CompiledModel, log: Option<&Path>) -> Result<Solution, SolverError>;
}

/// Timestamped trace of a solver run. Writes nothing if created without a path.
pub struct SolverLog {
    out: Option<BufWriter<File>>,
}

impl SolverLog {
    pub fn create(path: Option<&Path>) -> std::io::Result<SolverLog> {
        let out = match path {
            Some(path) => Some(BufWriter::new(File::create(path)?)),
            None => None,
        };
        Ok(SolverLog { out })
    }

    pub fn line(&mut self, message: impl Display) -> std::io::Result<()> {
        if let Some(out) = &mut self.out {
            let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
            writeln!(out, "[{}] {}", now, message)?;
        }
        Ok(())
    }

    pub fn finish(mut self) -> std::io::Result<()> {
        match &mut self.out {
            Some(out) => out.flush(),
            None => Ok(()),
        }
    }
}
