use prodplan_solver::{Solve, Solver};
use thiserror::Error;
use tracing::info;

use crate::builder::{ModelConstructionError, OptimizationModel, build};
use crate::data::ProblemData;
use crate::extract::{ExtractError, SolveResult, extract};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlanError {
    #[error(transparent)]
    Construction(#[from] ModelConstructionError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error("Scenario '{name}': {source}")]
    Scenario {
        name: String,
        #[source]
        source: Box<PlanError>,
    },
}

impl PlanError {
    pub(crate) fn in_scenario(self, name: &str) -> Self {
        PlanError::Scenario {
            name: name.to_string(),
            source: Box::new(self),
        }
    }
}

/// Runs build → solve → extract for one snapshot of problem data
#[derive(Debug, Clone, Default)]
pub struct Planner<S = Solver> {
    solver: S,
}

impl Planner<Solver> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S: Solve> Planner<S> {
    pub fn with_solver(solver: S) -> Self {
        Self { solver }
    }

    pub fn solver(&self) -> &S {
        &self.solver
    }

    /// Build the model for `data`, solve it and extract the result.
    /// Infeasible, unbounded and failed solves come back as `Ok` with the
    /// matching status.
    pub fn plan(&self, data: &ProblemData) -> Result<SolveResult, PlanError> {
        let model = build(data)?;
        self.solve_model(&model, data)
    }

    /// Solve an already built model
    pub fn solve_model(&self, model: &OptimizationModel, data: &ProblemData) -> Result<SolveResult, PlanError> {
        let solution = self.solver.solve(model.problem());
        let result = extract(model, &data.resources, &solution)?;

        match result.total_profit() {
            Some(total_profit) => info!(total_profit, nodes = solution.nodes, "plan optimal"),
            None => info!(status = %result.status, reason = ?result.reason, "no optimal plan"),
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prodplan_solver::{LpProblem, Solution, SolutionStatus};

    /// Stand-in for an external solver that reports a fixed answer
    struct Canned(Solution);

    impl Solve for Canned {
        fn solve(&self, _problem: &LpProblem) -> Solution {
            self.0.clone()
        }
    }

    #[test]
    fn test_reference_plan() {
        let result = Planner::new().plan(&ProblemData::reference()).unwrap();

        assert!(result.is_optimal());
        assert!((result.total_profit().unwrap() - 9935.0).abs() < 1e-6);
    }

    #[test]
    fn test_construction_error_propagates() {
        let data = ProblemData::reference().with_min_production("Product_A", 101).unwrap();

        assert!(matches!(
            Planner::new().plan(&data),
            Err(PlanError::Construction(ModelConstructionError::InvertedBounds { .. }))
        ));
    }

    #[test]
    fn test_infeasible_is_a_status() {
        // Minimums alone need 40 + 45 + 62.5 labor hours
        let data = ProblemData::reference()
            .with_capacity_multiplier("labor_hours", 0.25)
            .unwrap();

        let result = Planner::new().plan(&data).unwrap();

        assert_eq!(result.status, SolutionStatus::Infeasible);
        assert!(result.plan.is_none());
    }

    #[test]
    fn test_external_error_status_passes_through() {
        let planner = Planner::with_solver(Canned(Solution::error("solver process crashed", 0)));

        let result = planner.plan(&ProblemData::reference()).unwrap();

        assert_eq!(result.status, SolutionStatus::Error);
        assert_eq!(result.reason.as_deref(), Some("solver process crashed"));
        assert!(result.plan.is_none());
    }

    #[test]
    fn test_unbounded_is_a_status() {
        let planner = Planner::with_solver(Canned(Solution::unbounded(1)));

        let result = planner.plan(&ProblemData::reference()).unwrap();

        assert_eq!(result.status, SolutionStatus::Unbounded);
        assert!(result.plan.is_none());
        assert!(result.reason.is_some());
    }

    #[test]
    fn test_unrecognized_external_status_is_error() {
        let mut solution = Solution::error("Not Solved", 0);
        solution.status = SolutionStatus::from_label("Not Solved");
        let planner = Planner::with_solver(Canned(solution));

        let result = planner.plan(&ProblemData::reference()).unwrap();

        assert_eq!(result.status, SolutionStatus::Error);
    }

    #[test]
    fn test_non_integral_external_answer_is_rejected() {
        let planner = Planner::with_solver(Canned(Solution::optimal(vec![20.5, 15.0, 25.0], 0.0, 1)));

        assert!(matches!(
            planner.plan(&ProblemData::reference()),
            Err(PlanError::Extract(ExtractError::NonIntegral { .. }))
        ));
    }
}
