use good_lp::{
    Expression, ProblemVariables, ResolutionError, Solution, SolverModel, Variable, constraint,
    microlp, variable,
};
use tracing::debug;

use crate::errors::{OptimizeError, OptimizeResult};
use crate::milp::{MilpModel, MilpSolution, MilpSolver, Sense, SolveStatus, VarId};

///
/// Pure-Rust branch-and-bound through `good_lp`'s `microlp` backend.
///
/// microlp runs to completion, so every solution it returns is optimal.
///
#[derive(Debug, Clone, Copy, Default)]
pub struct MicroLpSolver;

fn expression(vars: &[Variable], terms: &[(VarId, f64)]) -> Expression {
    let mut expr = Expression::from(0.0);
    for (var, coefficient) in terms {
        expr.add_mul(*coefficient, vars[var.0]);
    }
    expr
}

impl MilpSolver for MicroLpSolver {
    fn solve(&self, model: &MilpModel) -> OptimizeResult<MilpSolution> {
        let mut problem = ProblemVariables::new();
        let vars: Vec<Variable> = (0..model.num_variables())
            .map(|_| problem.add(variable().binary()))
            .collect();

        let objective = expression(&vars, model.objective());
        let unsolved = match model.sense() {
            Sense::Minimize => problem.minimise(objective),
            Sense::Maximize => problem.maximise(objective),
        };
        let mut solver = unsolved.using(microlp);

        for c in model.constraints() {
            let lhs = expression(&vars, &c.terms);
            if let Some(lower) = c.lower {
                solver.add_constraint(constraint::geq(lhs.clone(), lower));
            }
            if let Some(upper) = c.upper {
                solver.add_constraint(constraint::leq(lhs, upper));
            }
        }

        debug!(
            "solving with microlp: {} variables, {} constraints",
            vars.len(),
            model.constraints().len()
        );

        let solution = solver.solve().map_err(|e| match e {
            ResolutionError::Infeasible => OptimizeError::Infeasible,
            ResolutionError::Unbounded => OptimizeError::Unbounded,
            other => OptimizeError::Solver(other.to_string()),
        })?;

        Ok(MilpSolution {
            status: SolveStatus::Optimal,
            values: vars.iter().map(|v| solution.value(*v)).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    fn test_minimum_cover() {
        // pick the fewest of a, b, c so that {a, b} and {b, c} are each hit
        let mut model = MilpModel::new();
        let a = model.add_binary();
        let b = model.add_binary();
        let c = model.add_binary();
        model.add_constraint(Some(1.0), None, vec![(a, 1.0), (b, 1.0)]);
        model.add_constraint(Some(1.0), None, vec![(b, 1.0), (c, 1.0)]);
        model.set_objective(Sense::Minimize, vec![(a, 1.0), (b, 1.0), (c, 1.0)]);

        let solution = MicroLpSolver.solve(&model).unwrap();
        assert_eq!(solution.status, SolveStatus::Optimal);
        assert!(solution.is_set(b));
        assert!(!solution.is_set(a));
        assert!(!solution.is_set(c));
    }

    #[rstest]
    fn test_infeasible() {
        let mut model = MilpModel::new();
        let a = model.add_binary();
        let b = model.add_binary();
        model.add_constraint(None, Some(1.0), vec![(a, 1.0), (b, 1.0)]);
        model.add_constraint(Some(1.0), None, vec![(a, 1.0)]);
        model.add_constraint(Some(1.0), None, vec![(b, 1.0)]);
        model.set_objective(Sense::Minimize, vec![(a, 1.0), (b, 1.0)]);

        assert!(matches!(
            MicroLpSolver.solve(&model),
            Err(OptimizeError::Infeasible)
        ));
    }

    #[rstest]
    fn test_maximize_within_bounds() {
        let mut model = MilpModel::new();
        let a = model.add_binary();
        let b = model.add_binary();
        model.add_constraint(None, Some(1.0), vec![(a, 1.0), (b, 1.0)]);
        model.set_objective(Sense::Maximize, vec![(a, 1.0), (b, 2.0)]);

        let solution = MicroLpSolver.solve(&model).unwrap();
        assert!(solution.is_set(b));
        assert!(!solution.is_set(a));
    }
}
