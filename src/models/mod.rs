pub mod aggregate_planning;
pub mod linear;
pub mod utils;

use std::fmt::Debug;

use derive_more::Display;

use crate::data::schema::Table;

pub use aggregate_planning::{AggregatePlanning, Formulation, PlanResult};

/// Errors raised while formulating a model from consistent-looking but incomplete data
#[derive(Debug, Display)]
pub enum ModelError {
    #[display(fmt = "table {} has no row for {}", table, key)]
    MissingLookup { table: Table, key: String },
}

impl ModelError {
    pub fn missing<K: Debug>(table: Table, key: K) -> ModelError {
        ModelError::MissingLookup {
            table,
            key: format!("{:?}", key),
        }
    }
}

impl std::error::Error for ModelError {}
