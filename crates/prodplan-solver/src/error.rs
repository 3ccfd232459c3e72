use thiserror::Error;

/// Reasons the solver gives up without a verdict. These never escape as
/// `Err`; they become the message of a [`crate::Solution`] with
/// [`crate::SolutionStatus::Error`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("Row {row} has {found} coefficients, expected {expected}")]
    DimensionMismatch { row: String, expected: usize, found: usize },
    #[error("Non-finite value in {0}")]
    NonFinite(String),
    #[error("Simplex iteration limit of {0} reached")]
    IterationLimit(usize),
    #[error("Branch-and-bound node limit of {0} reached")]
    NodeLimit(usize),
    #[error("Rounded solution violates {0}")]
    RoundingViolation(String),
}
