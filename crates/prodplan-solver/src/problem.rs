use crate::error::SolverError;

/// Represents a (mixed-integer) linear programming problem
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct LpProblem {
    /// Decision variables, all with an implicit lower bound of zero
    pub variables: Vec<Variable>,
    /// Objective function
    pub objective: Objective,
    /// Constraints
    pub constraints: Vec<Constraint>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub kind: VarKind,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Continuous,
    Integer,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Objective {
    /// Coefficients for each variable
    pub coefficients: Vec<f64>,
    pub sense: Sense,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Minimize,
    Maximize,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    /// Name/label for the constraint (for diagnostics)
    pub name: String,
    /// Coefficients for each variable
    pub coefficients: Vec<f64>,
    /// Comparison operator
    pub op: ConstraintOp,
    /// Right-hand side value
    pub rhs: f64,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintOp {
    /// Less than or equal (<=)
    Le,
    /// Greater than or equal (>=)
    Ge,
    /// Equal (=)
    Eq,
}

impl ConstraintOp {
    pub fn symbol(self) -> &'static str {
        match self {
            ConstraintOp::Le => "<=",
            ConstraintOp::Ge => ">=",
            ConstraintOp::Eq => "=",
        }
    }
}

impl Constraint {
    /// Left-hand side evaluated at `values`
    pub fn lhs(&self, values: &[f64]) -> f64 {
        self.coefficients
            .iter()
            .zip(values)
            .map(|(coef, value)| coef * value)
            .sum()
    }

    /// Whether `lhs` satisfies this constraint within `tolerance`
    pub fn holds(&self, lhs: f64, tolerance: f64) -> bool {
        match self.op {
            ConstraintOp::Le => lhs <= self.rhs + tolerance,
            ConstraintOp::Ge => lhs >= self.rhs - tolerance,
            ConstraintOp::Eq => (lhs - self.rhs).abs() <= tolerance,
        }
    }
}

impl LpProblem {
    pub fn new(variables: Vec<Variable>, sense: Sense) -> Self {
        let n = variables.len();
        Self {
            variables,
            objective: Objective {
                coefficients: vec![0.0; n],
                sense,
            },
            constraints: Vec::new(),
        }
    }

    /// Problem where every variable is integer-valued
    pub fn integer(names: impl IntoIterator<Item = impl Into<String>>, sense: Sense) -> Self {
        let variables = names
            .into_iter()
            .map(|name| Variable {
                name: name.into(),
                kind: VarKind::Integer,
            })
            .collect();
        Self::new(variables, sense)
    }

    /// Problem where every variable is continuous
    pub fn continuous(names: impl IntoIterator<Item = impl Into<String>>, sense: Sense) -> Self {
        let variables = names
            .into_iter()
            .map(|name| Variable {
                name: name.into(),
                kind: VarKind::Continuous,
            })
            .collect();
        Self::new(variables, sense)
    }

    pub fn set_objective(&mut self, coefficients: Vec<f64>) {
        self.objective.coefficients = coefficients;
    }

    pub fn add_constraint(&mut self, name: impl Into<String>, coefficients: Vec<f64>, op: ConstraintOp, rhs: f64) {
        self.constraints.push(Constraint {
            name: name.into(),
            coefficients,
            op,
            rhs,
        });
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_integer(&self, index: usize) -> bool {
        self.variables
            .get(index)
            .is_some_and(|v| v.kind == VarKind::Integer)
    }

    /// Objective value at `values`
    pub fn objective_value(&self, values: &[f64]) -> f64 {
        self.objective
            .coefficients
            .iter()
            .zip(values)
            .map(|(coef, value)| coef * value)
            .sum()
    }

    /// Reject problems whose rows don't line up with the variable list or
    /// that carry non-finite numbers
    pub fn validate(&self) -> Result<(), SolverError> {
        let n = self.num_variables();
        if self.objective.coefficients.len() != n {
            return Err(SolverError::DimensionMismatch {
                row: "objective".to_string(),
                expected: n,
                found: self.objective.coefficients.len(),
            });
        }
        if let Some(j) = self.objective.coefficients.iter().position(|c| !c.is_finite()) {
            return Err(SolverError::NonFinite(format!("objective coefficient {}", j)));
        }
        for c in &self.constraints {
            if c.coefficients.len() != n {
                return Err(SolverError::DimensionMismatch {
                    row: c.name.clone(),
                    expected: n,
                    found: c.coefficients.len(),
                });
            }
            if !c.rhs.is_finite() || c.coefficients.iter().any(|x| !x.is_finite()) {
                return Err(SolverError::NonFinite(c.name.clone()));
            }
        }
        Ok(())
    }

    /// Copy of this problem with one extra single-variable bound row,
    /// used for branching
    pub(crate) fn with_bound(&self, index: usize, op: ConstraintOp, rhs: f64) -> Self {
        let mut coefficients = vec![0.0; self.num_variables()];
        coefficients[index] = 1.0;
        let mut branched = self.clone();
        branched.add_constraint(
            format!("branch_{}_{}_{}", self.variables[index].name, op.symbol(), rhs),
            coefficients,
            op,
            rhs,
        );
        branched
    }
}
