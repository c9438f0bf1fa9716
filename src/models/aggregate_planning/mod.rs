pub mod model;
pub mod sets_and_parameters;

pub use model::{
    min_delivery, AggregatePlanning, Formulation, ObjectiveTerms, PlanResult, ProfitBreakdown,
    Variables,
};
pub use sets_and_parameters::{Parameters, Sets};
