mod branch;
mod error;
mod problem;
mod simplex;
mod solution;
mod solver;

pub use error::SolverError;
pub use problem::{Constraint, ConstraintOp, LpProblem, Objective, Sense, VarKind, Variable};
pub use solution::{ConstraintViolation, Solution, SolutionStatus, find_violations};
pub use solver::{Solve, Solver};
