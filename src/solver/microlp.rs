use std::{path::Path, time::Instant};

use good_lp::{
    default_solver, variable, Expression, ProblemVariables, ResolutionError, Solution as _,
    SolverModel, Variable,
};
use log::{debug, info, warn};

use super::{Solution, Solver, SolverError, SolverLog, SolverOptions, Status};
use crate::models::linear::{CompiledModel, ConstrSense, Expr, ObjSense, VarType};

/// Solves models with `good_lp` and its pure Rust `microlp` backend (simplex with branch and bound).
#[derive(Debug, Clone, Default)]
pub struct GoodLpSolver {
    options: SolverOptions,
}

impl GoodLpSolver {
    pub fn new(options: SolverOptions) -> GoodLpSolver {
        GoodLpSolver { options }
    }
}

fn expression(expr: &Expr, handles: &[Variable]) -> Expression {
    let mut out = Expression::with_capacity(expr.terms().len());
    for (var, coef) in expr.terms() {
        out.add_mul(*coef, handles[var.index()]);
    }
    out + expr.constant_term()
}

impl Solver for GoodLpSolver {
    fn name(&self) -> &'static str {
        "microlp"
    }

    fn solve(&self, model: &CompiledModel, log: Option<&Path>) -> Result<Solution, SolverError> {
        let mut trace = SolverLog::create(log)?;
        trace.line(format_args!(
            "model {}: {} variables, {} constraints, {}",
            model.name(),
            model.variables().len(),
            model.constraints().len(),
            model.sense()
        ))?;

        if let Some(limit) = self.options.time_limit {
            warn!(
                "The {} backend does not support time limits, ignoring limit of {:?}",
                self.name(),
                limit
            );
            trace.line(format_args!("time limit of {:?} ignored", limit))?;
        }

        let mut vars = ProblemVariables::new();
        let handles = model
            .variables()
            .iter()
            .map(|def| {
                let mut definition = variable().min(def.lower).name(def.name.clone());
                if def.upper.is_finite() {
                    definition = definition.max(def.upper);
                }
                if def.vtype == VarType::Integer {
                    definition = definition.integer();
                }
                vars.add(definition)
            })
            .collect::<Vec<_>>();

        let objective = expression(model.objective(), &handles);
        let unsolved = match model.sense() {
            ObjSense::Maximize => vars.maximise(objective),
            ObjSense::Minimize => vars.minimise(objective),
        };

        let mut problem = unsolved.using(default_solver);
        for constr in model.constraints() {
            let lhs = expression(&constr.lhs, &handles);
            let constraint = match constr.sense {
                ConstrSense::Less => lhs.leq(constr.rhs),
                ConstrSense::Greater => lhs.geq(constr.rhs),
                ConstrSense::Equal => lhs.eq(constr.rhs),
            };
            problem.add_constraint(constraint);
        }

        debug!("Handing model {} over to {}", model.name(), self.name());
        let start = Instant::now();
        let outcome = problem.solve();
        let elapsed = start.elapsed();

        let solution = match outcome {
            Ok(solved) => {
                let values = handles.iter().map(|v| solved.value(*v)).collect::<Vec<_>>();
                let objective = model.objective().evaluate(&values);
                Solution::new(Status::Optimal, objective, values)
            }
            Err(ResolutionError::Infeasible) => Solution::without_values(Status::Infeasible),
            Err(ResolutionError::Unbounded) => Solution::without_values(Status::Unbounded),
            Err(other) => {
                trace.line(format_args!("solver failed: {}", other))?;
                trace.finish()?;
                return Err(SolverError::Backend(other.to_string()));
            }
        };

        info!(
            "{} finished in {:.3}s with status {}",
            self.name(),
            elapsed.as_secs_f64(),
            solution.status()
        );
        trace.line(format_args!(
            "finished in {:.3}s with status {}",
            elapsed.as_secs_f64(),
            solution.status()
        ))?;
        if let Some(objective) = solution.objective() {
            trace.line(format_args!("objective value: {}", objective))?;
        }
        trace.finish()?;

        Ok(solution)
    }
}
