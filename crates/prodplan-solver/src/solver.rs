use tracing::{debug, warn};

use crate::branch::{BranchAndBound, MipOutcome};
use crate::problem::LpProblem;
use crate::simplex::Simplex;
use crate::solution::{Solution, find_violations};
use crate::error::SolverError;

/// Anything that can turn a problem into a [`Solution`].
///
/// Implementations must be deterministic for a fixed problem and must report
/// every failure through [`crate::SolutionStatus`] instead of panicking.
pub trait Solve {
    fn solve(&self, problem: &LpProblem) -> Solution;
}

impl<S: Solve + ?Sized> Solve for &S {
    fn solve(&self, problem: &LpProblem) -> Solution {
        (**self).solve(problem)
    }
}

/// Branch-and-bound solver for (mixed-)integer problems; purely continuous
/// problems finish at the root relaxation.
#[derive(Debug, Clone, Copy)]
pub struct Solver {
    /// Maximum simplex pivots per relaxation
    max_iterations: usize,
    /// Maximum relaxations solved per search
    max_nodes: usize,
    /// Tolerance for floating point comparisons
    tolerance: f64,
}

impl Default for Solver {
    fn default() -> Self {
        Self {
            max_iterations: 10_000,
            max_nodes: 100_000,
            tolerance: 1e-9,
        }
    }
}

impl Solver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_max_nodes(mut self, max: usize) -> Self {
        self.max_nodes = max;
        self
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    fn branch_and_bound(&self) -> BranchAndBound {
        BranchAndBound {
            simplex: Simplex {
                max_iterations: self.max_iterations,
                tolerance: self.tolerance,
                feasibility_tolerance: self.tolerance * 100.0,
            },
            max_nodes: self.max_nodes,
            integrality_tolerance: 1e-6,
        }
    }
}

impl Solve for Solver {
    fn solve(&self, problem: &LpProblem) -> Solution {
        if let Err(e) = problem.validate() {
            warn!(error = %e, "rejecting malformed problem");
            return Solution::error(e.to_string(), 0);
        }

        debug!(
            variables = problem.num_variables(),
            constraints = problem.num_constraints(),
            "solving"
        );

        let mut nodes = 0;
        let solution = match self.branch_and_bound().search(problem, &mut nodes) {
            Ok(MipOutcome::Optimal(values)) => {
                // Snapping integers can push a row over its bound when the
                // relaxation sat right at the integrality tolerance
                match find_violations(problem, &values, 1e-6).first() {
                    Some(v) => {
                        Solution::error(SolverError::RoundingViolation(v.constraint.clone()).to_string(), nodes)
                    }
                    None => {
                        let objective_value = problem.objective_value(&values);
                        Solution::optimal(values, objective_value, nodes)
                    }
                }
            }
            Ok(MipOutcome::Infeasible) => Solution::infeasible(nodes),
            Ok(MipOutcome::Unbounded) => Solution::unbounded(nodes),
            Err(e) => {
                warn!(error = %e, nodes, "solver gave up");
                Solution::error(e.to_string(), nodes)
            }
        };

        debug!(status = %solution.status, nodes, objective = solution.objective_value, "solved");
        solution
    }
}
