use std::path::Path;

use grb::{expr::LinExpr, prelude::*};
use log::{info, trace};

use super::{Solution, Solver, SolverError, SolverOptions, Status};
use crate::models::linear::{CompiledModel, ConstrSense, Expr, ObjSense, VarType};

/// Gurobi's representation of an infinite bound
const GRB_INFINITY: f64 = 1e100;

/// Solves models with Gurobi. Requires a Gurobi installation and license at build and run time.
#[derive(Debug, Clone, Default)]
pub struct GurobiSolver {
    options: SolverOptions,
}

impl GurobiSolver {
    pub fn new(options: SolverOptions) -> GurobiSolver {
        GurobiSolver { options }
    }
}

fn lin_expr(expr: &Expr, handles: &[grb::Var]) -> LinExpr {
    let mut out = LinExpr::new();
    for (var, coef) in expr.terms() {
        out.add_term(*coef, handles[var.index()]);
    }
    out.add_constant(expr.constant_term());
    out
}

fn bound(value: f64) -> f64 {
    value.clamp(-GRB_INFINITY, GRB_INFINITY)
}

/// Maps the optimization status reported by Gurobi, given the number of solutions it found
fn status(grb_status: grb::Status, solution_count: i32) -> Status {
    match grb_status {
        grb::Status::Optimal => Status::Optimal,
        grb::Status::Infeasible => Status::Infeasible,
        grb::Status::Unbounded => Status::Unbounded,
        grb::Status::InfOrUnbd => Status::InfeasibleOrUnbounded,
        _ if solution_count > 0 => Status::Feasible,
        _ => Status::Interrupted,
    }
}

impl Solver for GurobiSolver {
    fn name(&self) -> &'static str {
        "gurobi"
    }

    fn solve(&self, model: &CompiledModel, log: Option<&Path>) -> Result<Solution, SolverError> {
        let logfile = log.map(|p| p.to_string_lossy().into_owned()).unwrap_or_default();
        let env = Env::new(&logfile)?;
        let mut grb_model = Model::with_env(model.name(), &env)?;

        if let Some(limit) = self.options.time_limit {
            grb_model.set_param(param::TimeLimit, limit.as_secs_f64())?;
        }

        //*************CREATE VARIABLES*************//
        let mut handles = Vec::with_capacity(model.variables().len());
        for def in model.variables() {
            let vtype = match def.vtype {
                VarType::Continuous => grb::VarType::Continuous,
                VarType::Integer => grb::VarType::Integer,
            };
            handles.push(grb_model.add_var(
                &def.name,
                vtype,
                0.0,
                bound(def.lower),
                bound(def.upper),
                std::iter::empty(),
            )?);
        }
        grb_model.update()?;

        // ******************** ADD CONSTRAINTS ********************
        for constr in model.constraints() {
            let lhs = lin_expr(&constr.lhs, &handles);
            let rhs = constr.rhs;
            let c = match constr.sense {
                ConstrSense::Less => c!(lhs <= rhs),
                ConstrSense::Greater => c!(lhs >= rhs),
                ConstrSense::Equal => c!(lhs == rhs),
            };
            grb_model.add_constr(&constr.name, c)?;
        }

        let sense = match model.sense() {
            ObjSense::Maximize => Maximize,
            ObjSense::Minimize => Minimize,
        };
        grb_model.set_objective(lin_expr(model.objective(), &handles), sense)?;
        grb_model.update()?;

        trace!("Successfully built gurobi model {}", model.name());
        grb_model.optimize()?;

        let grb_status = grb_model.status()?;
        let status = status(grb_status, grb_model.get_attr(attr::SolCount)?);
        info!(
            "{} finished with status {} (gurobi: {:?})",
            self.name(),
            status,
            grb_status
        );

        if !status.has_solution() {
            return Ok(Solution::without_values(status));
        }

        let mut values = Vec::with_capacity(handles.len());
        for var in &handles {
            values.push(grb_model.get_obj_attr(attr::X, var)?);
        }
        let objective = grb_model.get_attr(attr::ObjVal)?;

        Ok(Solution::new(status, objective, values))
    }
}
