use std::fmt;
use std::sync::Arc;

use prodplan_solver::{Solve, Solver};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::builder::ModelConstructionError;
use crate::data::ProblemData;
use crate::extract::SolveResult;
use crate::planner::{PlanError, Planner};

type Mutation = dyn Fn(&ProblemData) -> Result<ProblemData, ModelConstructionError> + Send + Sync;

/// A named way of deriving a variant of the base data
#[derive(Clone)]
pub struct Scenario {
    name: String,
    mutation: Arc<Mutation>,
}

impl fmt::Debug for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scenario").field("name", &self.name).finish_non_exhaustive()
    }
}

impl Scenario {
    pub fn new(
        name: impl Into<String>,
        mutation: impl Fn(&ProblemData) -> Result<ProblemData, ModelConstructionError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            mutation: Arc::new(mutation),
        }
    }

    /// The base data, unchanged
    pub fn base(name: impl Into<String>) -> Self {
        Self::new(name, |data| Ok(data.clone()))
    }

    pub fn scale_profit(name: impl Into<String>, product: impl Into<String>, multiplier: f64) -> Self {
        let product = product.into();
        Self::new(name, move |data| data.with_profit_multiplier(&product, multiplier))
    }

    pub fn scale_capacity(name: impl Into<String>, resource: impl Into<String>, multiplier: f64) -> Self {
        let resource = resource.into();
        Self::new(name, move |data| data.with_capacity_multiplier(&resource, multiplier))
    }

    /// "Base Case" followed by "High Profit <product>" for every product
    pub fn profit_scenarios(data: &ProblemData, multiplier: f64) -> Vec<Self> {
        std::iter::once(Self::base("Base Case"))
            .chain(data.products.iter().map(|p| {
                Self::scale_profit(format!("High Profit {}", p.id), p.id.clone(), multiplier)
            }))
            .collect()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Derive this scenario's snapshot from `base`
    pub fn apply(&self, base: &ProblemData) -> Result<ProblemData, ModelConstructionError> {
        (self.mutation)(base)
    }
}

/// A scenario together with the data it was solved against and the result
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct SensitivityScenario {
    pub name: String,
    pub data: ProblemData,
    pub result: SolveResult,
}

impl SensitivityScenario {
    /// Change in total profit relative to `baseline`, when both are optimal
    pub fn profit_delta(&self, baseline: &SensitivityScenario) -> Option<f64> {
        Some(self.result.total_profit()? - baseline.result.total_profit()?)
    }
}

/// Re-solves the planning problem once per scenario
#[derive(Debug, Clone, Default)]
pub struct SensitivityAnalyzer<S = Solver> {
    planner: Planner<S>,
    parallel: bool,
}

impl SensitivityAnalyzer<Solver> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S: Solve + Sync> SensitivityAnalyzer<S> {
    pub fn with_planner(planner: Planner<S>) -> Self {
        Self {
            planner,
            parallel: false,
        }
    }

    /// Solve scenarios on the rayon pool instead of one after another
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Solve every scenario against its own snapshot of `base`.
    ///
    /// Output order follows `scenarios`. Scenarios that end infeasible,
    /// unbounded or in a solver error are kept with that status; a scenario
    /// whose derived data can't be modelled aborts the batch.
    pub fn analyze(&self, base: &ProblemData, scenarios: &[Scenario]) -> Result<Vec<SensitivityScenario>, PlanError> {
        info!(scenarios = scenarios.len(), parallel = self.parallel, "running sensitivity analysis");

        let results = if self.parallel {
            scenarios
                .par_iter()
                .map(|scenario| self.run(base, scenario))
                .collect::<Result<Vec<_>, _>>()
        } else {
            scenarios
                .iter()
                .map(|scenario| self.run(base, scenario))
                .collect::<Result<Vec<_>, _>>()
        }?;

        for outcome in &results {
            info!(
                scenario = %outcome.name,
                status = %outcome.result.status,
                total_profit = ?outcome.result.total_profit(),
                "scenario solved"
            );
        }

        Ok(results)
    }

    fn run(&self, base: &ProblemData, scenario: &Scenario) -> Result<SensitivityScenario, PlanError> {
        debug!(scenario = %scenario.name, "solving scenario");
        let data = scenario
            .apply(base)
            .map_err(|e| PlanError::from(e).in_scenario(&scenario.name))?;
        let result = self
            .planner
            .plan(&data)
            .map_err(|e| e.in_scenario(&scenario.name))?;

        Ok(SensitivityScenario {
            name: scenario.name.clone(),
            data,
            result,
        })
    }
}
