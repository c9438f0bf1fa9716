use std::{collections::BTreeMap, fmt::Debug};

use itertools::iproduct;

use super::linear::{Expr, Var};
use crate::solver::Solution;

/// Variables keyed by their index tuple. Iterates in lexicographic index order.
pub type VarMap<K> = BTreeMap<K, Var>;

pub trait AddVars {
    type Key: Ord + Copy + Debug;

    /// Create a variable for every index with a closure
    fn vars_with<E, F: FnMut(Self::Key) -> Result<Var, E>>(
        &self,
        func: F,
    ) -> Result<VarMap<Self::Key>, E>;
}

/// The name given to the variable of family `base_name` at index `key`, e.g. `production_(1, 2, 3)`
pub fn var_name<K: Debug>(base_name: &str, key: &K) -> String {
    format!("{}_{:?}", base_name, key)
}

impl AddVars for (&[usize], &[usize], &[usize]) {
    type Key = (usize, usize, usize);

    fn vars_with<E, F: FnMut(Self::Key) -> Result<Var, E>>(
        &self,
        mut func: F,
    ) -> Result<VarMap<Self::Key>, E> {
        let mut out = BTreeMap::new();
        for (&i, &j, &k) in iproduct!(self.0, self.1, self.2) {
            out.insert((i, j, k), func((i, j, k))?);
        }

        Ok(out)
    }
}

impl AddVars for (&[usize], &[usize], &[usize], &[usize]) {
    type Key = (usize, usize, usize, usize);

    fn vars_with<E, F: FnMut(Self::Key) -> Result<Var, E>>(
        &self,
        mut func: F,
    ) -> Result<VarMap<Self::Key>, E> {
        let mut out = BTreeMap::new();
        for (&i, &j, &k, &l) in iproduct!(self.0, self.1, self.2, self.3) {
            out.insert((i, j, k, l), func((i, j, k, l))?);
        }

        Ok(out)
    }
}

/// Trait that converts model variables to their solved values
pub trait ConvertVars {
    type Out;
    fn convert(&self, solution: &Solution) -> Self::Out;
}

impl ConvertVars for Var {
    type Out = Option<f64>;

    fn convert(&self, solution: &Solution) -> Self::Out {
        solution.value(*self)
    }
}

impl ConvertVars for Expr {
    type Out = Option<f64>;

    fn convert(&self, solution: &Solution) -> Self::Out {
        solution.values().map(|values| self.evaluate(values))
    }
}

impl<K: Ord + Copy, T: ConvertVars> ConvertVars for BTreeMap<K, T> {
    type Out = BTreeMap<K, T::Out>;

    fn convert(&self, solution: &Solution) -> Self::Out {
        self.iter()
            .map(|(key, var)| (*key, var.convert(solution)))
            .collect()
    }
}
