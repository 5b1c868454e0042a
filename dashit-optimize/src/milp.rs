//! A solver-independent 0/1 integer program.
//!
//! Models are built here and handed to any [MilpSolver]; the only backend
//! shipped is [crate::backends::MicroLpSolver].

use std::fmt::{self, Display};

use crate::errors::OptimizeResult;

#[derive(Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Clone, Copy)]
pub struct VarId(pub usize);

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum Sense {
    Minimize,
    Maximize,
}

///
/// `lower <= sum(coefficient * variable) <= upper`, either bound optional.
///
#[derive(PartialEq, Debug, Clone)]
pub struct LinearConstraint {
    pub terms: Vec<(VarId, f64)>,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

impl LinearConstraint {
    fn activity(&self, values: &[f64]) -> f64 {
        self.terms.iter().map(|(v, c)| c * values[v.0]).sum()
    }

    pub fn is_satisfied_by(&self, values: &[f64]) -> bool {
        const EPS: f64 = 1e-6;
        let activity = self.activity(values);
        self.lower.is_none_or(|l| activity >= l - EPS) && self.upper.is_none_or(|u| activity <= u + EPS)
    }
}

///
/// A model over binary variables.
///
#[derive(PartialEq, Debug, Clone)]
pub struct MilpModel {
    num_variables: usize,
    constraints: Vec<LinearConstraint>,
    objective: Vec<(VarId, f64)>,
    sense: Sense,
}

impl Default for MilpModel {
    fn default() -> Self {
        MilpModel {
            num_variables: 0,
            constraints: Vec::new(),
            objective: Vec::new(),
            sense: Sense::Minimize,
        }
    }
}

impl MilpModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_binary(&mut self) -> VarId {
        self.num_variables += 1;
        VarId(self.num_variables - 1)
    }

    pub fn add_constraint(
        &mut self,
        lower: Option<f64>,
        upper: Option<f64>,
        terms: Vec<(VarId, f64)>,
    ) {
        self.constraints.push(LinearConstraint {
            terms,
            lower,
            upper,
        });
    }

    pub fn set_objective(&mut self, sense: Sense, terms: Vec<(VarId, f64)>) {
        self.sense = sense;
        self.objective = terms;
    }

    pub fn num_variables(&self) -> usize {
        self.num_variables
    }

    pub fn constraints(&self) -> &[LinearConstraint] {
        &self.constraints
    }

    pub fn objective(&self) -> &[(VarId, f64)] {
        &self.objective
    }

    pub fn sense(&self) -> Sense {
        self.sense
    }

    pub fn is_satisfied_by(&self, values: &[f64]) -> bool {
        values.len() == self.num_variables
            && self.constraints.iter().all(|c| c.is_satisfied_by(values))
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum SolveStatus {
    /// proven optimal
    Optimal,
    /// feasible, but the solver stopped before proving optimality
    Feasible,
}

impl Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveStatus::Optimal => write!(f, "OPTIMAL"),
            SolveStatus::Feasible => write!(f, "FEASIBLE"),
        }
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct MilpSolution {
    pub status: SolveStatus,
    pub values: Vec<f64>,
}

impl MilpSolution {
    pub fn value(&self, var: VarId) -> f64 {
        self.values[var.0]
    }

    /// Is the binary variable set, allowing for solver round-off?
    pub fn is_set(&self, var: VarId) -> bool {
        self.value(var) > 0.5
    }
}

///
/// Anything that can solve a [MilpModel].
///
/// Infeasible models must be reported as
/// [crate::errors::OptimizeError::Infeasible], never as an empty solution.
///
pub trait MilpSolver {
    fn solve(&self, model: &MilpModel) -> OptimizeResult<MilpSolution>;
}
