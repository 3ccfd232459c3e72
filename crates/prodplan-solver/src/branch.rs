use tracing::trace;

use crate::error::SolverError;
use crate::problem::{ConstraintOp, LpProblem, Sense};
use crate::simplex::{LpOutcome, Simplex};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum MipOutcome {
    Optimal(Vec<f64>),
    Infeasible,
    Unbounded,
}

/// Depth-first branch-and-bound over the simplex relaxation. Branches on the
/// most fractional integer variable (lowest index on ties) so the search is
/// fully deterministic for a given problem.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BranchAndBound {
    pub simplex: Simplex,
    pub max_nodes: usize,
    /// Distance from the nearest integer still accepted as integral
    pub integrality_tolerance: f64,
}

struct Incumbent {
    values: Vec<f64>,
    score: f64,
}

impl BranchAndBound {
    /// Run the search; `nodes` is incremented for every relaxation solved,
    /// including when the search ends in an error
    pub fn search(&self, problem: &LpProblem, nodes: &mut usize) -> Result<MipOutcome, SolverError> {
        // Scores are always "larger is better"
        let sign = match problem.objective.sense {
            Sense::Maximize => 1.0,
            Sense::Minimize => -1.0,
        };

        let mut incumbent: Option<Incumbent> = None;
        let mut open = vec![problem.clone()];

        while let Some(node) = open.pop() {
            if *nodes >= self.max_nodes {
                return Err(SolverError::NodeLimit(self.max_nodes));
            }
            *nodes += 1;

            let values = match self.simplex.solve(&node)? {
                LpOutcome::Optimal(values) => values,
                LpOutcome::Infeasible => continue,
                // A bounded child can't come from an unbounded root and vice
                // versa, so this only fires at the root in practice
                LpOutcome::Unbounded => return Ok(MipOutcome::Unbounded),
            };

            let score = sign * node.objective_value(&values);
            if incumbent
                .as_ref()
                .is_some_and(|best| best.score >= score - self.simplex.tolerance)
            {
                continue;
            }

            match self.branching_variable(problem, &values) {
                None => {
                    let values = self.snap(problem, values);
                    let score = sign * problem.objective_value(&values);
                    trace!(node = *nodes, score, "new incumbent");
                    incumbent = Some(Incumbent { values, score });
                }
                Some(j) => {
                    let value = values[j];
                    trace!(node = *nodes, variable = %problem.variables[j].name, value, "branching");
                    open.push(node.with_bound(j, ConstraintOp::Le, value.floor()));
                    open.push(node.with_bound(j, ConstraintOp::Ge, value.ceil()));
                }
            }
        }

        Ok(match incumbent {
            Some(best) => MipOutcome::Optimal(best.values),
            None => MipOutcome::Infeasible,
        })
    }

    fn branching_variable(&self, problem: &LpProblem, values: &[f64]) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (j, &value) in values.iter().enumerate() {
            if !problem.is_integer(j) {
                continue;
            }
            let fraction = value - value.floor();
            let distance = fraction.min(1.0 - fraction);
            if distance <= self.integrality_tolerance {
                continue;
            }
            if best.is_none_or(|(_, d)| distance > d) {
                best = Some((j, distance));
            }
        }
        best.map(|(j, _)| j)
    }

    /// Round integer variables onto their integer value
    fn snap(&self, problem: &LpProblem, mut values: Vec<f64>) -> Vec<f64> {
        for (j, value) in values.iter_mut().enumerate() {
            if problem.is_integer(j) {
                *value = value.round();
            }
        }
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn search(problem: &LpProblem) -> (MipOutcome, usize) {
        let bnb = BranchAndBound {
            simplex: Simplex::default(),
            max_nodes: 10_000,
            integrality_tolerance: 1e-6,
        };
        let mut nodes = 0;
        let outcome = bnb.search(problem, &mut nodes).unwrap();
        (outcome, nodes)
    }

    #[test]
    fn test_rounding_the_relaxation_is_not_optimal() {
        // max 5x + 4y  s.t.  6x + 4y <= 24, x + 2y <= 6
        // LP optimum (3, 1.5); integer optimum (4, 0) with 20
        let mut problem = LpProblem::integer(["x", "y"], Sense::Maximize);
        problem.set_objective(vec![5.0, 4.0]);
        problem.add_constraint("a", vec![6.0, 4.0], ConstraintOp::Le, 24.0);
        problem.add_constraint("b", vec![1.0, 2.0], ConstraintOp::Le, 6.0);

        let (outcome, nodes) = search(&problem);
        let MipOutcome::Optimal(values) = outcome else {
            panic!("expected optimal, got {:?}", outcome);
        };

        assert!(nodes > 1);
        assert!((problem.objective_value(&values) - 20.0).abs() < 1e-9);
        assert!(values.iter().all(|v| v.fract() == 0.0));
    }

    #[test]
    fn test_matches_enumeration() {
        // max 7x + 9y + 4z  s.t.  3x + 4y + 2z <= 17, x + 3y + z <= 9, z >= 1
        let mut problem = LpProblem::integer(["x", "y", "z"], Sense::Maximize);
        problem.set_objective(vec![7.0, 9.0, 4.0]);
        problem.add_constraint("a", vec![3.0, 4.0, 2.0], ConstraintOp::Le, 17.0);
        problem.add_constraint("b", vec![1.0, 3.0, 1.0], ConstraintOp::Le, 9.0);
        problem.add_constraint("z_min", vec![0.0, 0.0, 1.0], ConstraintOp::Ge, 1.0);

        let mut best = f64::NEG_INFINITY;
        for x in 0..=10 {
            for y in 0..=10 {
                for z in 1..=10 {
                    let (x, y, z) = (x as f64, y as f64, z as f64);
                    if 3.0 * x + 4.0 * y + 2.0 * z <= 17.0 && x + 3.0 * y + z <= 9.0 {
                        best = best.max(7.0 * x + 9.0 * y + 4.0 * z);
                    }
                }
            }
        }

        let (outcome, _) = search(&problem);
        let MipOutcome::Optimal(values) = outcome else {
            panic!("expected optimal, got {:?}", outcome);
        };
        assert!((problem.objective_value(&values) - best).abs() < 1e-9);
    }

    #[test]
    fn test_integer_infeasible_but_relaxation_feasible() {
        // 2x = 3 has the continuous solution 1.5 only
        let mut problem = LpProblem::integer(["x"], Sense::Maximize);
        problem.set_objective(vec![1.0]);
        problem.add_constraint("half", vec![2.0], ConstraintOp::Eq, 3.0);

        assert_eq!(search(&problem).0, MipOutcome::Infeasible);
    }

    #[test]
    fn test_unbounded_root() {
        let mut problem = LpProblem::integer(["x"], Sense::Maximize);
        problem.set_objective(vec![1.0]);
        problem.add_constraint("floor", vec![1.0], ConstraintOp::Ge, 2.0);

        assert_eq!(search(&problem).0, MipOutcome::Unbounded);
    }

    #[test]
    fn test_node_limit() {
        let mut problem = LpProblem::integer(["x", "y"], Sense::Maximize);
        problem.set_objective(vec![5.0, 4.0]);
        problem.add_constraint("a", vec![6.0, 4.0], ConstraintOp::Le, 24.0);
        problem.add_constraint("b", vec![1.0, 2.0], ConstraintOp::Le, 6.0);

        let bnb = BranchAndBound {
            simplex: Simplex::default(),
            max_nodes: 1,
            integrality_tolerance: 1e-6,
        };
        let mut nodes = 0;
        assert_eq!(bnb.search(&problem, &mut nodes), Err(SolverError::NodeLimit(1)));
        assert_eq!(nodes, 1);
    }
}
