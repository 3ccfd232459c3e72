use std::collections::BTreeMap;

use crate::builder::ModelConstructionError;

/// A product the plant can make
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: String,
    /// Profit per unit produced
    pub profit_per_unit: f64,
    /// Units of each resource consumed per unit produced, keyed by resource name
    pub consumption: BTreeMap<String, f64>,
    /// Upper bound on production (market demand)
    pub max_demand: u64,
    /// Contractual minimum production
    pub min_production: u64,
}

/// A shared resource with a fixed capacity
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ResourcePool {
    pub name: String,
    pub capacity: f64,
}

/// Everything needed to build a planning model. Values are never mutated in
/// place; the `with_*` helpers derive new snapshots.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProblemData {
    pub products: Vec<Product>,
    pub resources: Vec<ResourcePool>,
}

impl Product {
    pub fn new(id: impl Into<String>, profit_per_unit: f64) -> Self {
        Self {
            id: id.into(),
            profit_per_unit,
            consumption: BTreeMap::new(),
            max_demand: 0,
            min_production: 0,
        }
    }

    pub fn with_consumption(mut self, resource: impl Into<String>, rate: f64) -> Self {
        self.consumption.insert(resource.into(), rate);
        self
    }

    pub fn with_bounds(mut self, min_production: u64, max_demand: u64) -> Self {
        self.min_production = min_production;
        self.max_demand = max_demand;
        self
    }

    /// Consumption rate for `resource`, if the product declares one
    pub fn rate(&self, resource: &str) -> Option<f64> {
        self.consumption.get(resource).copied()
    }
}

impl ResourcePool {
    pub fn new(name: impl Into<String>, capacity: f64) -> Self {
        Self {
            name: name.into(),
            capacity,
        }
    }
}

impl ProblemData {
    pub fn new(products: Vec<Product>, resources: Vec<ResourcePool>) -> Self {
        Self { products, resources }
    }

    /// Three products sharing labor, machine time and raw material
    pub fn reference() -> Self {
        let product = |id: &str, profit: f64, labor: f64, machine: f64, material: f64| {
            Product::new(id, profit)
                .with_consumption("labor_hours", labor)
                .with_consumption("machine_hours", machine)
                .with_consumption("raw_material", material)
        };

        Self::new(
            vec![
                product("Product_A", 50.0, 2.0, 1.5, 3.0).with_bounds(20, 100),
                product("Product_B", 75.0, 3.0, 2.0, 4.0).with_bounds(15, 80),
                product("Product_C", 60.0, 2.5, 1.8, 3.5).with_bounds(25, 120),
            ],
            vec![
                ResourcePool::new("labor_hours", 400.0),
                ResourcePool::new("machine_hours", 300.0),
                ResourcePool::new("raw_material", 1000.0),
            ],
        )
    }

    pub fn product(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    pub fn resource(&self, name: &str) -> Option<&ResourcePool> {
        self.resources.iter().find(|r| r.name == name)
    }

    /// Copy with one product's profit per unit scaled by `multiplier`
    pub fn with_profit_multiplier(&self, product: &str, multiplier: f64) -> Result<Self, ModelConstructionError> {
        self.with_product(product, |p| p.profit_per_unit *= multiplier)
    }

    /// Copy with one product's contractual minimum replaced
    pub fn with_min_production(&self, product: &str, min_production: u64) -> Result<Self, ModelConstructionError> {
        self.with_product(product, |p| p.min_production = min_production)
    }

    /// Copy with one resource's capacity scaled by `multiplier`
    pub fn with_capacity_multiplier(&self, resource: &str, multiplier: f64) -> Result<Self, ModelConstructionError> {
        let mut derived = self.clone();
        let pool = derived
            .resources
            .iter_mut()
            .find(|r| r.name == resource)
            .ok_or_else(|| ModelConstructionError::UnknownResource(resource.to_string()))?;
        pool.capacity *= multiplier;
        Ok(derived)
    }

    fn with_product(&self, id: &str, change: impl FnOnce(&mut Product)) -> Result<Self, ModelConstructionError> {
        let mut derived = self.clone();
        let product = derived
            .products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| ModelConstructionError::UnknownProduct(id.to_string()))?;
        change(product);
        Ok(derived)
    }
}
