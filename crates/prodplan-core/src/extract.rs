use prodplan_solver::{ConstraintOp, Solution, SolutionStatus};
use thiserror::Error;
use tracing::{debug, warn};

use crate::builder::{ConstraintKind, OptimizationModel};
use crate::data::ResourcePool;

/// Tolerance for treating a solver value as an integer
const INTEGRALITY_TOLERANCE: f64 = 1e-6;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractError {
    #[error("Assignment has {found} values for {expected} products")]
    AssignmentLength { expected: usize, found: usize },
    #[error("Product {product} was assigned non-integral quantity {value}")]
    NonIntegral { product: String, value: f64 },
    #[error("Resource {0} has zero capacity, utilization is undefined")]
    ZeroCapacity(String),
    #[error("Resource {0} has no capacity row in the model")]
    UnknownResource(String),
}

/// Units planned for one product
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ProductQuantity {
    pub product: String,
    pub quantity: u64,
    /// quantity × profit per unit
    pub profit: f64,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceUsage {
    pub resource: String,
    pub used: f64,
    pub available: f64,
    /// used / available × 100, never clamped
    pub utilization_percent: f64,
}

/// Realized left-hand side of one model row
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintValue {
    pub id: String,
    pub kind: ConstraintKind,
    pub value: f64,
    pub op: ConstraintOp,
    pub rhs: f64,
}

impl ConstraintValue {
    /// Distance from the bound; zero means the row is binding
    pub fn slack(&self) -> f64 {
        match self.op {
            ConstraintOp::Le => self.rhs - self.value,
            ConstraintOp::Ge => self.value - self.rhs,
            ConstraintOp::Eq => (self.value - self.rhs).abs(),
        }
    }

    pub fn is_binding(&self, tolerance: f64) -> bool {
        self.slack().abs() <= tolerance
    }
}

/// Everything known about an optimal plan
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ProductionPlan {
    pub quantities: Vec<ProductQuantity>,
    pub total_profit: f64,
    pub resource_usage: Vec<ResourceUsage>,
    pub constraint_values: Vec<ConstraintValue>,
}

impl ProductionPlan {
    pub fn quantity(&self, product: &str) -> Option<u64> {
        self.quantities
            .iter()
            .find(|q| q.product == product)
            .map(|q| q.quantity)
    }

    pub fn usage(&self, resource: &str) -> Option<&ResourceUsage> {
        self.resource_usage.iter().find(|u| u.resource == resource)
    }

    pub fn constraint_value(&self, id: &str) -> Option<&ConstraintValue> {
        self.constraint_values.iter().find(|c| c.id == id)
    }

    /// Resource with the highest utilization
    pub fn bottleneck(&self) -> Option<&ResourceUsage> {
        self.resource_usage
            .iter()
            .max_by(|a, b| a.utilization_percent.total_cmp(&b.utilization_percent))
    }
}

/// Outcome of one planning solve. `plan` is present exactly when the status
/// is optimal; otherwise `reason` explains why there is none.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct SolveResult {
    pub status: SolutionStatus,
    pub reason: Option<String>,
    pub plan: Option<ProductionPlan>,
}

impl SolveResult {
    pub fn not_optimal(status: SolutionStatus, reason: impl Into<String>) -> Self {
        Self {
            status,
            reason: Some(reason.into()),
            plan: None,
        }
    }

    pub fn is_optimal(&self) -> bool {
        self.status == SolutionStatus::Optimal
    }

    pub fn total_profit(&self) -> Option<f64> {
        self.plan.as_ref().map(|p| p.total_profit)
    }

    pub fn quantity(&self, product: &str) -> Option<u64> {
        self.plan.as_ref().and_then(|p| p.quantity(product))
    }
}

/// Turn a solver answer for `model` into a [`SolveResult`]
pub fn extract(
    model: &OptimizationModel,
    resources: &[ResourcePool],
    solution: &Solution,
) -> Result<SolveResult, ExtractError> {
    if solution.status != SolutionStatus::Optimal {
        let reason = solution
            .message
            .clone()
            .unwrap_or_else(|| format!("Solver finished with status {}", solution.status));
        return Ok(SolveResult::not_optimal(solution.status, reason));
    }

    let quantities = integral_quantities(model, &solution.values)?;
    let assignment: Vec<f64> = quantities.iter().map(|&q| q as f64).collect();

    let total_profit = model.objective_value(&assignment);
    if (total_profit - solution.objective_value).abs() > 1e-6 * total_profit.abs().max(1.0) {
        warn!(
            total_profit,
            reported = solution.objective_value,
            "solver objective differs from recomputed profit"
        );
    }

    let quantities = model
        .products()
        .zip(model.profits())
        .zip(&quantities)
        .map(|((product, &profit), &quantity)| ProductQuantity {
            product: product.to_string(),
            quantity,
            profit: profit * quantity as f64,
        })
        .collect();

    let resource_usage = resources
        .iter()
        .map(|resource| usage_of(model, resource, &assignment))
        .collect::<Result<Vec<_>, _>>()?;

    let constraint_values = model
        .constraints()
        .map(|(kind, row)| ConstraintValue {
            id: row.name.clone(),
            kind: kind.clone(),
            value: row.lhs(&assignment),
            op: row.op,
            rhs: row.rhs,
        })
        .collect();

    debug!(total_profit, "extracted plan");

    Ok(SolveResult {
        status: SolutionStatus::Optimal,
        reason: None,
        plan: Some(ProductionPlan {
            quantities,
            total_profit,
            resource_usage,
            constraint_values,
        }),
    })
}

fn integral_quantities(model: &OptimizationModel, values: &[f64]) -> Result<Vec<u64>, ExtractError> {
    if values.len() != model.num_products() {
        return Err(ExtractError::AssignmentLength {
            expected: model.num_products(),
            found: values.len(),
        });
    }

    model
        .products()
        .zip(values)
        .map(|(product, &value)| {
            let rounded = value.round();
            if !value.is_finite() || rounded < 0.0 || (value - rounded).abs() > INTEGRALITY_TOLERANCE {
                return Err(ExtractError::NonIntegral {
                    product: product.to_string(),
                    value,
                });
            }
            Ok(rounded as u64)
        })
        .collect()
}

fn usage_of(
    model: &OptimizationModel,
    resource: &ResourcePool,
    assignment: &[f64],
) -> Result<ResourceUsage, ExtractError> {
    let row = model
        .capacity_row(&resource.name)
        .ok_or_else(|| ExtractError::UnknownResource(resource.name.clone()))?;

    if resource.capacity == 0.0 {
        return Err(ExtractError::ZeroCapacity(resource.name.clone()));
    }

    let used = row.lhs(assignment);
    let utilization_percent = used / resource.capacity * 100.0;
    if utilization_percent > 100.0 + 1e-9 {
        warn!(
            resource = %resource.name,
            used,
            available = resource.capacity,
            "resource over capacity, bounds are inconsistent with limits"
        );
    }

    Ok(ResourceUsage {
        resource: resource.name.clone(),
        used,
        available: resource.capacity,
        utilization_percent,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build;
    use crate::data::ProblemData;

    fn reference_solution(values: Vec<f64>) -> (OptimizationModel, ProblemData, Solution) {
        let data = ProblemData::reference();
        let model = build(&data).unwrap();
        let objective = model.objective_value(&values);
        (model, data, Solution::optimal(values, objective, 1))
    }

    #[test]
    fn test_extract_optimal() {
        let (model, data, solution) = reference_solution(vec![49.0, 79.0, 26.0]);
        let result = extract(&model, &data.resources, &solution).unwrap();

        assert!(result.is_optimal());
        assert!(result.reason.is_none());
        assert_eq!(result.quantity("Product_B"), Some(79));
        assert_eq!(result.total_profit(), Some(9935.0));

        let plan = result.plan.unwrap();
        assert_eq!(plan.quantities[0].profit, 2450.0);

        let labor = plan.usage("labor_hours").unwrap();
        assert!((labor.used - 400.0).abs() < 1e-9);
        assert_eq!(labor.available, 400.0);
        assert!((labor.utilization_percent - 100.0).abs() < 1e-9);

        let machine = plan.usage("machine_hours").unwrap();
        assert!((machine.used - 278.3).abs() < 1e-9);
        assert_eq!(plan.bottleneck().unwrap().resource, "labor_hours");

        let floor = plan.constraint_value("min_production:Product_C").unwrap();
        assert_eq!(floor.value, 26.0);
        assert_eq!(floor.slack(), 1.0);
        assert!(plan.constraint_value("capacity:labor_hours").unwrap().is_binding(1e-9));
        assert_eq!(plan.constraint_values.len(), 9);
    }

    #[test]
    fn test_non_optimal_has_no_plan() {
        let data = ProblemData::reference();
        let model = build(&data).unwrap();

        let result = extract(&model, &data.resources, &Solution::infeasible(4)).unwrap();

        assert_eq!(result.status, SolutionStatus::Infeasible);
        assert!(result.plan.is_none());
        assert!(result.total_profit().is_none());
        assert!(result.quantity("Product_A").is_none());
        assert!(result.reason.is_some());
    }

    #[test]
    fn test_zero_capacity_is_an_error() {
        let mut data = ProblemData::reference();
        data.resources[1].capacity = 0.0;
        let model = build(&data).unwrap();
        let solution = Solution::optimal(vec![20.0, 15.0, 25.0], 0.0, 1);

        assert_eq!(
            extract(&model, &data.resources, &solution),
            Err(ExtractError::ZeroCapacity("machine_hours".to_string()))
        );
    }

    #[test]
    fn test_over_capacity_is_preserved() {
        let mut data = ProblemData::reference();
        data.resources[0].capacity = 100.0;
        let model = build(&data).unwrap();
        let solution = Solution::optimal(vec![20.0, 15.0, 25.0], 0.0, 1);

        let result = extract(&model, &data.resources, &solution).unwrap();
        let labor = result.plan.unwrap().usage("labor_hours").unwrap().clone();

        // 40 + 45 + 62.5 hours against 100 available
        assert!((labor.utilization_percent - 147.5).abs() < 1e-9);
    }

    #[test]
    fn test_non_integral_assignment_rejected() {
        let (model, data, solution) = reference_solution(vec![49.5, 79.0, 26.0]);

        assert!(matches!(
            extract(&model, &data.resources, &solution),
            Err(ExtractError::NonIntegral { product, .. }) if product == "Product_A"
        ));
    }

    #[test]
    fn test_wrong_length_rejected() {
        let (model, data, solution) = reference_solution(vec![49.0, 79.0]);

        assert_eq!(
            extract(&model, &data.resources, &solution),
            Err(ExtractError::AssignmentLength { expected: 3, found: 2 })
        );
    }

    #[test]
    fn test_unknown_resource_rejected() {
        let (model, _, solution) = reference_solution(vec![49.0, 79.0, 26.0]);
        let resources = vec![ResourcePool::new("steam", 10.0)];

        assert_eq!(
            extract(&model, &resources, &solution),
            Err(ExtractError::UnknownResource("steam".to_string()))
        );
    }
}
