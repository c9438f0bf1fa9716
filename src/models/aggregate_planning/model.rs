use std::{collections::BTreeMap, path::Path};

use itertools::iproduct;
use log::{debug, info, trace, warn};

use super::sets_and_parameters::{
    CenterIndex, ClientIndex, Parameters, PeriodIndex, ProductIndex, Sets, SupplierIndex,
};
use crate::config::Settings;
use crate::data::Quantity;
use crate::models::{
    linear::{CompiledModel, Expr, LinearSum, ModelBuilder, ObjSense, VarType},
    utils::{var_name, AddVars, ConvertVars, VarMap},
    ModelError,
};
use crate::solver::{Solution, Solver, Status};

pub struct Variables {
    /// units of product i produced at center j in period t, indexed (i, j, t)
    pub production: VarMap<(ProductIndex, CenterIndex, PeriodIndex)>,
    /// units of product i shipped from center j to client k in period t, indexed (i, j, k, t)
    pub shipment: VarMap<(ProductIndex, CenterIndex, ClientIndex, PeriodIndex)>,
    /// units of product i bought from supplier q for client k in period t, indexed (i, q, k, t)
    pub outsource: VarMap<(ProductIndex, SupplierIndex, ClientIndex, PeriodIndex)>,
    /// units of product i held at center j at the end of period t, indexed (i, j, t). Period 0 is the initial inventory
    pub inventory: VarMap<(ProductIndex, CenterIndex, PeriodIndex)>,
}

/// The components of the profit being maximized
#[derive(Debug, Clone)]
pub struct ObjectiveTerms {
    pub revenue: Expr,
    pub production_cost: Expr,
    pub shipment_cost: Expr,
    pub outsourcing_cost: Expr,
    pub inventory_cost: Expr,
}

impl ObjectiveTerms {
    pub fn profit(&self) -> Expr {
        self.revenue.clone()
            - self.production_cost.clone()
            - self.shipment_cost.clone()
            - self.outsourcing_cost.clone()
            - self.inventory_cost.clone()
    }
}

/// A formulated aggregate planning model along with handles to its variables
pub struct Formulation {
    pub model: CompiledModel,
    pub variables: Variables,
    pub objective: ObjectiveTerms,
}

/// The smallest number of units that must be delivered to satisfy `demand` at the given letdown tolerance.
/// Truncates towards zero.
pub fn min_delivery(demand: Quantity, let_down_tol: f64) -> Quantity {
    (demand as f64 * let_down_tol).floor() as Quantity
}

pub struct AggregatePlanning {}

#[allow(non_snake_case)]
impl AggregatePlanning {
    /// builds the aggregate planning model
    pub fn build(
        sets: &Sets,
        parameters: &Parameters,
        settings: &Settings,
    ) -> Result<Formulation, ModelError> {
        info!("Building aggregate planning model {}", settings.name);

        let mut model = ModelBuilder::new(&settings.name);

        //*************CREATE VARIABLES*************//
        let variables = Self::variables(&mut model, sets, parameters, settings)?;

        // ******************** ADD CONSTRAINTS ********************
        Self::inventory_balance(&mut model, sets, &variables);
        Self::max_outsourcing_from_suppliers(&mut model, sets, parameters, &variables)?;
        Self::satisfy_demand(&mut model, sets, parameters, settings, &variables)?;

        // ******************** SET OBJECTIVE ********************
        let objective = ObjectiveTerms {
            revenue: Self::sales_revenue(sets, parameters, &variables)?,
            production_cost: Self::production_cost(sets, parameters, &variables)?,
            shipment_cost: Self::shipment_cost(sets, parameters, &variables),
            outsourcing_cost: Self::outsourcing_cost(sets, parameters, &variables),
            inventory_cost: Self::inventory_cost(sets, parameters, &variables)?,
        };
        model.set_objective(objective.profit(), ObjSense::Maximize);

        info!(
            "Successfully built model {} with {} variables and {} constraints",
            settings.name,
            model.num_vars(),
            model.num_constrs()
        );

        Ok(Formulation {
            model: model.compile(),
            variables,
            objective,
        })
    }

    /// Creates every decision variable, already bounded by the capabilities of the centers and the
    /// availability of lanes and supplier offers.
    fn variables(
        model: &mut ModelBuilder,
        sets: &Sets,
        parameters: &Parameters,
        settings: &Settings,
    ) -> Result<Variables, ModelError> {
        let (P, J, K, Q) = (&sets.P[..], &sets.J[..], &sets.K[..], &sets.Q[..]);
        let (T, T0) = (&sets.T[..], &sets.T0[..]);

        let production = (P, J, T).vars_with(|key @ (i, j, _)| {
            let upper = parameters.capability(i, j)?.max_production as f64;
            Ok::<_, ModelError>(model.add_var(
                &var_name("production", &key),
                VarType::Integer,
                0.0,
                upper,
            ))
        })?;

        // a lane that is not in the transport table cannot be used
        let mut closed_lanes = 0;
        let shipment = (P, J, K, T).vars_with(|key @ (i, j, k, _)| {
            let upper = match parameters.transportation_cost(i, j, k) {
                Some(_) => f64::INFINITY,
                None => {
                    closed_lanes += 1;
                    0.0
                }
            };
            Ok::<_, ModelError>(model.add_var(
                &var_name("shipment", &key),
                VarType::Integer,
                0.0,
                upper,
            ))
        })?;

        let mut closed_offers = 0;
        let outsource = (P, Q, K, T).vars_with(|key @ (i, q, k, _)| {
            let upper = match parameters.product_cost(i, q, k) {
                Some(_) => f64::INFINITY,
                None => {
                    closed_offers += 1;
                    0.0
                }
            };
            Ok::<_, ModelError>(model.add_var(
                &var_name("outsource", &key),
                VarType::Integer,
                0.0,
                upper,
            ))
        })?;

        // inventory at the end of period 0 is fixed to the initial inventory
        let initial = settings.init_inventory as f64;
        let inventory = (P, J, T0).vars_with(|key @ (i, j, t)| {
            let (lower, upper) = match t {
                0 => (initial, initial),
                _ => (0.0, parameters.capability(i, j)?.max_storage as f64),
            };
            Ok::<_, ModelError>(model.add_var(
                &var_name("inventory", &key),
                VarType::Integer,
                lower,
                upper,
            ))
        })?;

        debug!(
            "Created {} variables, {} shipment variables fixed to zero by missing lanes and {} outsource variables fixed to zero by missing offers",
            model.num_vars(),
            closed_lanes,
            closed_offers
        );

        Ok(Variables {
            production,
            shipment,
            outsource,
            inventory,
        })
    }

    /// Stock carried over plus production equals shipments plus stock carried forward
    fn inventory_balance(model: &mut ModelBuilder, sets: &Sets, variables: &Variables) {
        let Variables {
            production,
            shipment,
            inventory,
            ..
        } = variables;

        for (&i, &j, &t) in iproduct!(&sets.P, &sets.J, &sets.T) {
            let shipped = sets.K.iter().map(|&k| shipment[&(i, j, k, t)]).lin_sum();
            let lhs = inventory[&(i, j, t - 1)] + production[&(i, j, t)]
                - shipped
                - inventory[&(i, j, t)];
            model.add_constr(
                format!("inventory_balance_{:?}", (i, j, t)),
                lhs.eq(0.0),
            );
        }

        trace!("Added inventory balance constraints");
    }

    /// The total bought from a supplier in a period cannot exceed its capacity
    fn max_outsourcing_from_suppliers(
        model: &mut ModelBuilder,
        sets: &Sets,
        parameters: &Parameters,
        variables: &Variables,
    ) -> Result<(), ModelError> {
        for (&i, &q) in iproduct!(&sets.P, &sets.Q) {
            let max_quantity = parameters.max_quantity(i, q)? as f64;
            for &t in &sets.T {
                let bought = sets
                    .K
                    .iter()
                    .map(|&k| variables.outsource[&(i, q, k, t)])
                    .lin_sum();
                model.add_constr(
                    format!("supplier_cap_{:?}", (i, q, t)),
                    bought.leq(max_quantity),
                );
            }
        }

        trace!("Added supplier capacity constraints");
        Ok(())
    }

    /// Deliver no more than requested, and at least the letdown tolerance of it
    fn satisfy_demand(
        model: &mut ModelBuilder,
        sets: &Sets,
        parameters: &Parameters,
        settings: &Settings,
        variables: &Variables,
    ) -> Result<(), ModelError> {
        for (&i, &k, &t) in iproduct!(&sets.P, &sets.K, &sets.T) {
            let demand = parameters.demand(i, k, t)?.quantity;

            let total_shipment = sets
                .J
                .iter()
                .map(|&j| variables.shipment[&(i, j, k, t)])
                .lin_sum();
            let total_outsourcing = sets
                .Q
                .iter()
                .map(|&q| variables.outsource[&(i, q, k, t)])
                .lin_sum();
            let total_sent = total_shipment + total_outsourcing;

            model.add_constr(
                format!("demand_upper_{:?}", (i, k, t)),
                total_sent.clone().leq(demand as f64),
            );
            model.add_constr(
                format!("demand_lower_{:?}", (i, k, t)),
                total_sent.geq(min_delivery(demand, settings.let_down_tol) as f64),
            );
        }

        trace!("Added demand constraints");
        Ok(())
    }

    /// Income from every unit shipped from the centers
    fn sales_revenue(
        sets: &Sets,
        parameters: &Parameters,
        variables: &Variables,
    ) -> Result<Expr, ModelError> {
        let mut revenue = Expr::new();
        for (&i, &j, &k, &t) in iproduct!(&sets.P, &sets.J, &sets.K, &sets.T) {
            let price = parameters.demand(i, k, t)?.purchase_price;
            revenue += price * variables.shipment[&(i, j, k, t)];
        }

        Ok(revenue)
    }

    fn production_cost(
        sets: &Sets,
        parameters: &Parameters,
        variables: &Variables,
    ) -> Result<Expr, ModelError> {
        let mut cost = Expr::new();
        for (&i, &j) in iproduct!(&sets.P, &sets.J) {
            let unit_cost = parameters.capability(i, j)?.production_cost;
            for &t in &sets.T {
                cost += unit_cost * variables.production[&(i, j, t)];
            }
        }

        Ok(cost)
    }

    /// Transportation cost over the lanes of the transport table
    fn shipment_cost(sets: &Sets, parameters: &Parameters, variables: &Variables) -> Expr {
        iproduct!(&sets.P, &sets.J, &sets.K)
            .filter_map(|(&i, &j, &k)| {
                parameters
                    .transportation_cost(i, j, k)
                    .map(|cost| (i, j, k, cost))
            })
            .flat_map(|(i, j, k, cost)| {
                sets.T
                    .iter()
                    .map(move |&t| cost * variables.shipment[&(i, j, k, t)])
            })
            .lin_sum()
    }

    /// Purchase cost over the offers of the supplier table
    fn outsourcing_cost(sets: &Sets, parameters: &Parameters, variables: &Variables) -> Expr {
        iproduct!(&sets.P, &sets.Q, &sets.K)
            .filter_map(|(&i, &q, &k)| {
                parameters
                    .product_cost(i, q, k)
                    .map(|cost| (i, q, k, cost))
            })
            .flat_map(|(i, q, k, cost)| {
                sets.T
                    .iter()
                    .map(move |&t| cost * variables.outsource[&(i, q, k, t)])
            })
            .lin_sum()
    }

    /// Holding cost of the inventory at the end of every planning period. The initial inventory is free.
    fn inventory_cost(
        sets: &Sets,
        parameters: &Parameters,
        variables: &Variables,
    ) -> Result<Expr, ModelError> {
        let mut cost = Expr::new();
        for (&i, &j) in iproduct!(&sets.P, &sets.J) {
            let unit_cost = parameters.capability(i, j)?.inventory_cost;
            for &t in &sets.T {
                cost += unit_cost * variables.inventory[&(i, j, t)];
            }
        }

        Ok(cost)
    }

    /// Builds and solves the model, returning the formulation together with the outcome of the solve
    pub fn solve(
        sets: &Sets,
        parameters: &Parameters,
        settings: &Settings,
        solver: &dyn Solver,
        log: Option<&Path>,
    ) -> Result<(Formulation, Solution), crate::Error> {
        let formulation = AggregatePlanning::build(sets, parameters, settings)?;
        let solution = solver.solve(&formulation.model, log)?;

        match solution.status() {
            Status::Optimal | Status::Feasible => info!(
                "Model {} solved by {}: {}, profit = {:?}",
                settings.name,
                solver.name(),
                solution.status(),
                solution.objective()
            ),
            status => warn!(
                "Model {} could not be solved by {}: {}",
                settings.name,
                solver.name(),
                status
            ),
        }

        Ok((formulation, solution))
    }
}

/// Solved values of every variable family, keyed like [`Variables`]. Values are `None` if there is no solution.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanResult {
    pub status: Status,
    pub objective: Option<f64>,
    pub production: BTreeMap<(ProductIndex, CenterIndex, PeriodIndex), Option<f64>>,
    pub shipment: BTreeMap<(ProductIndex, CenterIndex, ClientIndex, PeriodIndex), Option<f64>>,
    pub outsource: BTreeMap<(ProductIndex, SupplierIndex, ClientIndex, PeriodIndex), Option<f64>>,
    pub inventory: BTreeMap<(ProductIndex, CenterIndex, PeriodIndex), Option<f64>>,
    pub breakdown: ProfitBreakdown,
}

/// Solved values of the [`ObjectiveTerms`]
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ProfitBreakdown {
    pub revenue: Option<f64>,
    pub production_cost: Option<f64>,
    pub shipment_cost: Option<f64>,
    pub outsourcing_cost: Option<f64>,
    pub inventory_cost: Option<f64>,
}

impl PlanResult {
    pub fn new(formulation: &Formulation, solution: &Solution) -> PlanResult {
        let Formulation {
            variables,
            objective,
            ..
        } = formulation;

        PlanResult {
            status: solution.status(),
            objective: solution.objective(),
            production: variables.production.convert(solution),
            shipment: variables.shipment.convert(solution),
            outsource: variables.outsource.convert(solution),
            inventory: variables.inventory.convert(solution),
            breakdown: ProfitBreakdown {
                revenue: objective.revenue.convert(solution),
                production_cost: objective.production_cost.convert(solution),
                shipment_cost: objective.shipment_cost.convert(solution),
                outsourcing_cost: objective.outsourcing_cost.convert(solution),
                inventory_cost: objective.inventory_cost.convert(solution),
            },
        }
    }
}
