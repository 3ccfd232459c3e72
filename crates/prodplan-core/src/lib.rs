pub mod builder;
pub mod data;
pub mod extract;
pub mod planner;
pub mod sensitivity;

pub use builder::{ConstraintKind, ModelConstructionError, OptimizationModel, build};
pub use data::{ProblemData, Product, ResourcePool};
pub use extract::{
    ConstraintValue, ExtractError, ProductQuantity, ProductionPlan, ResourceUsage, SolveResult, extract,
};
pub use planner::{PlanError, Planner};
pub use sensitivity::{Scenario, SensitivityAnalyzer, SensitivityScenario};

pub use prodplan_solver::{Solution, SolutionStatus, Solve, Solver};
