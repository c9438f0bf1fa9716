//! A small solver-independent representation of (mixed integer) linear programs.
//!
//! Models are assembled through a [`ModelBuilder`], which owns the variables, constraints and objective
//! while the formulation is being written. [`ModelBuilder::compile`] consumes the builder and yields a
//! [`CompiledModel`], which can no longer be changed and is what solver backends and the report consume.

use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign},
};

use derive_more::Display;
use serde::Serialize;

use crate::utils::EPSILON;

/// Handle to a variable of a model. Only meaningful for the builder/model that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Var(usize);

impl Var {
    /// The position of the variable in [`CompiledModel::variables`]
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarType {
    Continuous,
    Integer,
}

/// Definition of a single variable
#[derive(Debug, Clone, PartialEq)]
pub struct VarDef {
    pub name: String,
    pub vtype: VarType,
    pub lower: f64,
    pub upper: f64,
}

impl VarDef {
    /// Whether the lower and upper bound coincide
    pub fn is_fixed(&self) -> bool {
        (self.upper - self.lower).abs() < EPSILON
    }
}

/// A linear expression `sum(coef * var) + constant`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Expr {
    terms: Vec<(Var, f64)>,
    constant: f64,
}

impl Expr {
    pub fn new() -> Expr {
        Expr::default()
    }

    pub fn constant(value: f64) -> Expr {
        Expr {
            terms: Vec::new(),
            constant: value,
        }
    }

    pub fn terms(&self) -> &[(Var, f64)] {
        &self.terms
    }

    pub fn constant_term(&self) -> f64 {
        self.constant
    }

    /// Evaluate the expression where `values[v.index()]` is the value of variable `v`
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|(var, coef)| coef * values[var.0])
            .sum::<f64>()
            + self.constant
    }

    pub fn leq(self, rhs: impl Into<Expr>) -> Constr {
        Constr::new(self, ConstrSense::Less, rhs.into())
    }

    pub fn geq(self, rhs: impl Into<Expr>) -> Constr {
        Constr::new(self, ConstrSense::Greater, rhs.into())
    }

    pub fn eq(self, rhs: impl Into<Expr>) -> Constr {
        Constr::new(self, ConstrSense::Equal, rhs.into())
    }
}

impl From<Var> for Expr {
    fn from(var: Var) -> Self {
        Expr {
            terms: vec![(var, 1.0)],
            constant: 0.0,
        }
    }
}

impl From<&Var> for Expr {
    fn from(var: &Var) -> Self {
        Expr::from(*var)
    }
}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        Expr::constant(value)
    }
}

impl<T: Into<Expr>> AddAssign<T> for Expr {
    fn add_assign(&mut self, rhs: T) {
        let rhs = rhs.into();
        self.terms.extend(rhs.terms);
        self.constant += rhs.constant;
    }
}

impl<T: Into<Expr>> SubAssign<T> for Expr {
    fn sub_assign(&mut self, rhs: T) {
        *self += -rhs.into();
    }
}

impl<T: Into<Expr>> Add<T> for Expr {
    type Output = Expr;

    fn add(mut self, rhs: T) -> Self::Output {
        self += rhs;
        self
    }
}

impl<T: Into<Expr>> Sub<T> for Expr {
    type Output = Expr;

    fn sub(mut self, rhs: T) -> Self::Output {
        self -= rhs;
        self
    }
}

impl Neg for Expr {
    type Output = Expr;

    fn neg(self) -> Self::Output {
        -1.0 * self
    }
}

impl Mul<Expr> for f64 {
    type Output = Expr;

    fn mul(self, mut rhs: Expr) -> Self::Output {
        for (_, coef) in &mut rhs.terms {
            *coef *= self;
        }
        rhs.constant *= self;
        rhs
    }
}

impl<T: Into<Expr>> Add<T> for Var {
    type Output = Expr;

    fn add(self, rhs: T) -> Self::Output {
        Expr::from(self) + rhs
    }
}

impl<T: Into<Expr>> Sub<T> for Var {
    type Output = Expr;

    fn sub(self, rhs: T) -> Self::Output {
        Expr::from(self) - rhs
    }
}

impl Mul<Var> for f64 {
    type Output = Expr;

    fn mul(self, rhs: Var) -> Self::Output {
        Expr {
            terms: vec![(rhs, self)],
            constant: 0.0,
        }
    }
}

impl Mul<f64> for Var {
    type Output = Expr;

    fn mul(self, rhs: f64) -> Self::Output {
        rhs * self
    }
}

impl Sum<Expr> for Expr {
    fn sum<I: Iterator<Item = Expr>>(iter: I) -> Self {
        let mut out = Expr::new();
        for expr in iter {
            out += expr;
        }
        out
    }
}

/// Summation over iterators of anything that converts into an expression.
pub trait LinearSum {
    fn lin_sum(self) -> Expr;
}

impl<I> LinearSum for I
where
    I: Iterator,
    I::Item: Into<Expr>,
{
    fn lin_sum(self) -> Expr {
        self.map(Into::into).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ConstrSense {
    #[display(fmt = "<=")]
    Less,
    #[display(fmt = ">=")]
    Greater,
    #[display(fmt = "=")]
    Equal,
}

/// A linear constraint on the form `lhs sense rhs`, where `lhs` holds every variable and `rhs` is a constant.
#[derive(Debug, Clone, PartialEq)]
pub struct Constr {
    pub name: String,
    pub lhs: Expr,
    pub sense: ConstrSense,
    pub rhs: f64,
}

impl Constr {
    fn new(lhs: Expr, sense: ConstrSense, rhs: Expr) -> Constr {
        let mut lhs = lhs - rhs;
        let rhs = -lhs.constant;
        lhs.constant = 0.0;
        Constr {
            name: String::new(),
            lhs,
            sense,
            rhs,
        }
    }

    /// Whether the constraint holds for the given values, up to `tolerance`
    pub fn is_satisfied(&self, values: &[f64], tolerance: f64) -> bool {
        let lhs = self.lhs.evaluate(values);
        match self.sense {
            ConstrSense::Less => lhs <= self.rhs + tolerance,
            ConstrSense::Greater => lhs >= self.rhs - tolerance,
            ConstrSense::Equal => (lhs - self.rhs).abs() <= tolerance,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
pub enum ObjSense {
    Minimize,
    Maximize,
}

/// Owns a model while it is being formulated.
#[derive(Debug)]
pub struct ModelBuilder {
    name: String,
    vars: Vec<VarDef>,
    constrs: Vec<Constr>,
    objective: Expr,
    sense: ObjSense,
}

impl ModelBuilder {
    pub fn new(name: &str) -> ModelBuilder {
        ModelBuilder {
            name: name.to_string(),
            vars: Vec::new(),
            constrs: Vec::new(),
            objective: Expr::new(),
            sense: ObjSense::Minimize,
        }
    }

    pub fn add_var(&mut self, name: &str, vtype: VarType, lower: f64, upper: f64) -> Var {
        let var = Var(self.vars.len());
        self.vars.push(VarDef {
            name: name.to_string(),
            vtype,
            lower,
            upper,
        });
        var
    }

    pub fn add_constr(&mut self, name: impl Display, mut constr: Constr) {
        constr.name = name.to_string();
        self.constrs.push(constr);
    }

    pub fn set_objective(&mut self, expr: impl Into<Expr>, sense: ObjSense) {
        self.objective = expr.into();
        self.sense = sense;
    }

    pub fn num_vars(&self) -> usize {
        self.vars.len()
    }

    pub fn num_constrs(&self) -> usize {
        self.constrs.len()
    }

    /// Finish the formulation.
    pub fn compile(self) -> CompiledModel {
        CompiledModel {
            name: self.name,
            vars: self.vars,
            constrs: self.constrs,
            objective: self.objective,
            sense: self.sense,
        }
    }
}

/// A fully formulated model. Immutable.
#[derive(Debug, Clone)]
pub struct CompiledModel {
    name: String,
    vars: Vec<VarDef>,
    constrs: Vec<Constr>,
    objective: Expr,
    sense: ObjSense,
}

impl CompiledModel {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn variables(&self) -> &[VarDef] {
        &self.vars
    }

    pub fn variable(&self, var: Var) -> &VarDef {
        &self.vars[var.0]
    }

    pub fn constraints(&self) -> &[Constr] {
        &self.constrs
    }

    pub fn objective(&self) -> &Expr {
        &self.objective
    }

    pub fn sense(&self) -> ObjSense {
        self.sense
    }

    /// Names of every bound, integrality requirement and constraint that `values` violates.
    pub fn violations(&self, values: &[f64], tolerance: f64) -> Vec<String> {
        let mut out = Vec::new();
        for (def, value) in self.vars.iter().zip(values) {
            if *value < def.lower - tolerance || *value > def.upper + tolerance {
                out.push(format!("bounds of {}", def.name));
            }
            if def.vtype == VarType::Integer && (value - value.round()).abs() > tolerance {
                out.push(format!("integrality of {}", def.name));
            }
        }

        for constr in &self.constrs {
            if !constr.is_satisfied(values, tolerance) {
                out.push(constr.name.clone());
            }
        }

        out
    }
}
