use std::collections::HashSet;

use prodplan_solver::{Constraint, ConstraintOp, LpProblem, Sense};
use thiserror::Error;
use tracing::debug;

use crate::data::{ProblemData, Product};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelConstructionError {
    #[error("No products to plan")]
    NoProducts,
    #[error("No resources declared")]
    NoResources,
    #[error("Duplicate product: {0}")]
    DuplicateProduct(String),
    #[error("Duplicate resource: {0}")]
    DuplicateResource(String),
    #[error("Unknown product: {0}")]
    UnknownProduct(String),
    #[error("Unknown resource: {0}")]
    UnknownResource(String),
    #[error("Product {product} has no consumption rate for resource {resource}")]
    MissingConsumption { product: String, resource: String },
    #[error("Product {product} consumes undeclared resource {resource}")]
    UnknownConsumption { product: String, resource: String },
    #[error("Product {product} has invalid consumption rate {rate} for {resource}")]
    InvalidRate { product: String, resource: String, rate: f64 },
    #[error("Product {product} has non-positive profit per unit {profit}")]
    InvalidProfit { product: String, profit: f64 },
    #[error("Product {product} requires at least {min} units but demand caps it at {max}")]
    InvertedBounds { product: String, min: u64, max: u64 },
    #[error("Resource {resource} has invalid capacity {capacity}")]
    InvalidCapacity { resource: String, capacity: f64 },
}

/// What a model row stands for
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstraintKind {
    /// Total consumption of a resource stays within its capacity
    Capacity { resource: String },
    /// Production stays within market demand
    MaxDemand { product: String },
    /// Production meets the contractual minimum
    MinProduction { product: String },
}

impl ConstraintKind {
    /// Stable identifier, also used as the solver-side row name
    pub fn id(&self) -> String {
        match self {
            ConstraintKind::Capacity { resource } => format!("capacity:{}", resource),
            ConstraintKind::MaxDemand { product } => format!("max_demand:{}", product),
            ConstraintKind::MinProduction { product } => format!("min_production:{}", product),
        }
    }
}

/// Integer program for one snapshot of [`ProblemData`].
///
/// Variables are the product quantities in product order. Rows are laid out
/// as one capacity row per resource, then one demand ceiling per product,
/// then one production floor per product.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationModel {
    problem: LpProblem,
    kinds: Vec<ConstraintKind>,
}

impl OptimizationModel {
    /// The solver-facing problem
    pub fn problem(&self) -> &LpProblem {
        &self.problem
    }

    /// Product ids, one per decision variable
    pub fn products(&self) -> impl Iterator<Item = &str> {
        self.problem.variables.iter().map(|v| v.name.as_str())
    }

    pub fn num_products(&self) -> usize {
        self.problem.num_variables()
    }

    /// Profit per unit, one per decision variable
    pub fn profits(&self) -> &[f64] {
        &self.problem.objective.coefficients
    }

    /// Every row with what it stands for
    pub fn constraints(&self) -> impl Iterator<Item = (&ConstraintKind, &Constraint)> {
        self.kinds.iter().zip(&self.problem.constraints)
    }

    /// The capacity row of `resource`
    pub fn capacity_row(&self, resource: &str) -> Option<&Constraint> {
        self.constraints().find_map(|(kind, row)| match kind {
            ConstraintKind::Capacity { resource: r } if r == resource => Some(row),
            _ => None,
        })
    }

    /// Objective (total profit) at `quantities`
    pub fn objective_value(&self, quantities: &[f64]) -> f64 {
        self.problem.objective_value(quantities)
    }
}

/// Translate problem data into its integer program, rejecting malformed data
pub fn build(data: &ProblemData) -> Result<OptimizationModel, ModelConstructionError> {
    validate(data)?;

    let mut problem = LpProblem::integer(data.products.iter().map(|p| p.id.clone()), Sense::Maximize);
    problem.set_objective(data.products.iter().map(|p| p.profit_per_unit).collect());

    let mut kinds = Vec::with_capacity(data.resources.len() + 2 * data.products.len());
    let mut push = |problem: &mut LpProblem, kind: ConstraintKind, coefficients: Vec<f64>, op: ConstraintOp, rhs: f64| {
        problem.add_constraint(kind.id(), coefficients, op, rhs);
        kinds.push(kind);
    };

    for resource in &data.resources {
        // Validated above, every product carries a rate for every resource
        let rates = data
            .products
            .iter()
            .map(|p| p.rate(&resource.name).unwrap_or_default())
            .collect();
        push(
            &mut problem,
            ConstraintKind::Capacity {
                resource: resource.name.clone(),
            },
            rates,
            ConstraintOp::Le,
            resource.capacity,
        );
    }

    for (j, product) in data.products.iter().enumerate() {
        push(
            &mut problem,
            ConstraintKind::MaxDemand {
                product: product.id.clone(),
            },
            unit_row(data.products.len(), j),
            ConstraintOp::Le,
            product.max_demand as f64,
        );
    }

    for (j, product) in data.products.iter().enumerate() {
        push(
            &mut problem,
            ConstraintKind::MinProduction {
                product: product.id.clone(),
            },
            unit_row(data.products.len(), j),
            ConstraintOp::Ge,
            product.min_production as f64,
        );
    }

    debug!(
        products = problem.num_variables(),
        constraints = problem.num_constraints(),
        "built planning model"
    );

    Ok(OptimizationModel { problem, kinds })
}

fn unit_row(n: usize, j: usize) -> Vec<f64> {
    let mut row = vec![0.0; n];
    row[j] = 1.0;
    row
}

fn validate(data: &ProblemData) -> Result<(), ModelConstructionError> {
    if data.products.is_empty() {
        return Err(ModelConstructionError::NoProducts);
    }
    if data.resources.is_empty() {
        return Err(ModelConstructionError::NoResources);
    }

    let mut resource_names = HashSet::new();
    for resource in &data.resources {
        if !resource_names.insert(resource.name.as_str()) {
            return Err(ModelConstructionError::DuplicateResource(resource.name.clone()));
        }
        // Zero is allowed here; utilization reporting rejects it later
        if !resource.capacity.is_finite() || resource.capacity < 0.0 {
            return Err(ModelConstructionError::InvalidCapacity {
                resource: resource.name.clone(),
                capacity: resource.capacity,
            });
        }
    }

    let mut product_ids = HashSet::new();
    for product in &data.products {
        if !product_ids.insert(product.id.as_str()) {
            return Err(ModelConstructionError::DuplicateProduct(product.id.clone()));
        }
        validate_product(product, &resource_names, data)?;
    }

    Ok(())
}

fn validate_product(
    product: &Product,
    resource_names: &HashSet<&str>,
    data: &ProblemData,
) -> Result<(), ModelConstructionError> {
    if !product.profit_per_unit.is_finite() || product.profit_per_unit <= 0.0 {
        return Err(ModelConstructionError::InvalidProfit {
            product: product.id.clone(),
            profit: product.profit_per_unit,
        });
    }

    if product.min_production > product.max_demand {
        return Err(ModelConstructionError::InvertedBounds {
            product: product.id.clone(),
            min: product.min_production,
            max: product.max_demand,
        });
    }

    if let Some(resource) = product
        .consumption
        .keys()
        .find(|name| !resource_names.contains(name.as_str()))
    {
        return Err(ModelConstructionError::UnknownConsumption {
            product: product.id.clone(),
            resource: resource.clone(),
        });
    }

    for resource in &data.resources {
        let rate = product
            .rate(&resource.name)
            .ok_or_else(|| ModelConstructionError::MissingConsumption {
                product: product.id.clone(),
                resource: resource.name.clone(),
            })?;
        if !rate.is_finite() || rate < 0.0 {
            return Err(ModelConstructionError::InvalidRate {
                product: product.id.clone(),
                resource: resource.name.clone(),
                rate,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ResourcePool;
    use prodplan_solver::VarKind;

    #[test]
    fn test_build_reference_model() {
        let model = build(&ProblemData::reference()).unwrap();

        assert_eq!(model.num_products(), 3);
        assert_eq!(model.profits(), &[50.0, 75.0, 60.0]);
        assert_eq!(model.problem().objective.sense, Sense::Maximize);
        assert!(model.problem().variables.iter().all(|v| v.kind == VarKind::Integer));

        // 3 capacity rows + 3 demand ceilings + 3 production floors
        assert_eq!(model.problem().num_constraints(), 9);

        let ids: Vec<String> = model.constraints().map(|(kind, _)| kind.id()).collect();
        assert_eq!(
            ids,
            vec![
                "capacity:labor_hours",
                "capacity:machine_hours",
                "capacity:raw_material",
                "max_demand:Product_A",
                "max_demand:Product_B",
                "max_demand:Product_C",
                "min_production:Product_A",
                "min_production:Product_B",
                "min_production:Product_C",
            ]
        );
    }

    #[test]
    fn test_rows_carry_rates_and_bounds() {
        let model = build(&ProblemData::reference()).unwrap();

        let machine = model.capacity_row("machine_hours").unwrap();
        assert_eq!(machine.coefficients, vec![1.5, 2.0, 1.8]);
        assert_eq!(machine.op, ConstraintOp::Le);
        assert_eq!(machine.rhs, 300.0);

        let (kind, floor) = model.constraints().nth(7).unwrap();
        assert_eq!(
            kind,
            &ConstraintKind::MinProduction {
                product: "Product_B".to_string()
            }
        );
        assert_eq!(floor.coefficients, vec![0.0, 1.0, 0.0]);
        assert_eq!(floor.op, ConstraintOp::Ge);
        assert_eq!(floor.rhs, 15.0);

        assert!(model.capacity_row("steam").is_none());
    }

    #[test]
    fn test_objective_value() {
        let model = build(&ProblemData::reference()).unwrap();
        assert_eq!(model.objective_value(&[1.0, 2.0, 3.0]), 50.0 + 150.0 + 180.0);
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let data = ProblemData::reference().with_min_production("Product_C", 121).unwrap();

        assert_eq!(
            build(&data),
            Err(ModelConstructionError::InvertedBounds {
                product: "Product_C".to_string(),
                min: 121,
                max: 120,
            })
        );
    }

    #[test]
    fn test_missing_consumption_rejected() {
        let mut data = ProblemData::reference();
        data.products[1].consumption.remove("raw_material");

        assert_eq!(
            build(&data),
            Err(ModelConstructionError::MissingConsumption {
                product: "Product_B".to_string(),
                resource: "raw_material".to_string(),
            })
        );
    }

    #[test]
    fn test_undeclared_consumption_rejected() {
        let mut data = ProblemData::reference();
        data.products[0].consumption.insert("steam".to_string(), 1.0);

        assert!(matches!(
            build(&data),
            Err(ModelConstructionError::UnknownConsumption { resource, .. }) if resource == "steam"
        ));
    }

    #[test]
    fn test_negative_capacity_rejected() {
        let mut data = ProblemData::reference();
        data.resources[2].capacity = -1.0;

        assert!(matches!(
            build(&data),
            Err(ModelConstructionError::InvalidCapacity { .. })
        ));
    }

    #[test]
    fn test_zero_capacity_accepted() {
        let mut data = ProblemData::reference();
        data.resources[0].capacity = 0.0;

        assert!(build(&data).is_ok());
    }

    #[test]
    fn test_duplicates_rejected() {
        let mut data = ProblemData::reference();
        data.resources.push(ResourcePool::new("labor_hours", 10.0));
        assert_eq!(
            build(&data),
            Err(ModelConstructionError::DuplicateResource("labor_hours".to_string()))
        );

        let mut data = ProblemData::reference();
        let copy = data.products[0].clone();
        data.products.push(copy);
        assert_eq!(
            build(&data),
            Err(ModelConstructionError::DuplicateProduct("Product_A".to_string()))
        );
    }

    #[test]
    fn test_invalid_numbers_rejected() {
        let data = ProblemData::reference().with_profit_multiplier("Product_A", 0.0).unwrap();
        assert!(matches!(build(&data), Err(ModelConstructionError::InvalidProfit { .. })));

        let mut data = ProblemData::reference();
        data.products[2].consumption.insert("labor_hours".to_string(), f64::NAN);
        assert!(matches!(build(&data), Err(ModelConstructionError::InvalidRate { .. })));
    }

    #[test]
    fn test_empty_data_rejected() {
        assert_eq!(build(&ProblemData::default()), Err(ModelConstructionError::NoProducts));

        let data = ProblemData::new(vec![Product::new("solo", 1.0)], Vec::new());
        assert_eq!(build(&data), Err(ModelConstructionError::NoResources));
    }
}
