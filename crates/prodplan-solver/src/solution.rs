use crate::problem::{ConstraintOp, LpProblem};

/// The result of solving an LP/MIP problem
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    /// Solution status
    pub status: SolutionStatus,
    /// Value of each variable; empty unless optimal
    pub values: Vec<f64>,
    /// Objective value; zero unless optimal
    pub objective_value: f64,
    /// Human-readable explanation for non-optimal outcomes
    pub message: Option<String>,
    /// Branch-and-bound nodes explored
    pub nodes: usize,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolutionStatus {
    /// An optimal solution was found
    Optimal,
    /// The problem is infeasible (no solution exists)
    Infeasible,
    /// The problem is unbounded
    Unbounded,
    /// Solver encountered an error
    Error,
}

impl SolutionStatus {
    /// Map a status label reported by an external solver onto the closed set
    /// of statuses. Anything unrecognized is treated as `Error`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "optimal" => SolutionStatus::Optimal,
            "infeasible" => SolutionStatus::Infeasible,
            "unbounded" => SolutionStatus::Unbounded,
            _ => SolutionStatus::Error,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SolutionStatus::Optimal => "Optimal",
            SolutionStatus::Infeasible => "Infeasible",
            SolutionStatus::Unbounded => "Unbounded",
            SolutionStatus::Error => "Error",
        }
    }
}

impl std::fmt::Display for SolutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.label())
    }
}

/// Information about a violated constraint
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintViolation {
    /// Constraint name
    pub constraint: String,
    /// Required value (from constraint RHS)
    pub required: f64,
    /// Actual value achieved
    pub actual: f64,
    /// How much the constraint is violated by
    pub violation_amount: f64,
}

impl Solution {
    pub fn optimal(values: Vec<f64>, objective_value: f64, nodes: usize) -> Self {
        Self {
            status: SolutionStatus::Optimal,
            values,
            objective_value,
            message: None,
            nodes,
        }
    }

    pub fn infeasible(nodes: usize) -> Self {
        Self::without_values(
            SolutionStatus::Infeasible,
            "No assignment satisfies all constraints".to_string(),
            nodes,
        )
    }

    pub fn unbounded(nodes: usize) -> Self {
        Self::without_values(
            SolutionStatus::Unbounded,
            "The objective has no finite optimum".to_string(),
            nodes,
        )
    }

    pub fn error(message: impl Into<String>, nodes: usize) -> Self {
        Self::without_values(SolutionStatus::Error, message.into(), nodes)
    }

    fn without_values(status: SolutionStatus, message: String, nodes: usize) -> Self {
        Self {
            status,
            values: Vec::new(),
            objective_value: 0.0,
            message: Some(message),
            nodes,
        }
    }

    pub fn is_optimal(&self) -> bool {
        self.status == SolutionStatus::Optimal
    }
}

/// Constraints of `problem` violated by `values`, worst first
pub fn find_violations(problem: &LpProblem, values: &[f64], tolerance: f64) -> Vec<ConstraintViolation> {
    let mut violations: Vec<ConstraintViolation> = problem
        .constraints
        .iter()
        .filter_map(|c| {
            let lhs = c.lhs(values);
            if c.holds(lhs, tolerance) {
                return None;
            }
            let violation_amount = match c.op {
                ConstraintOp::Le => lhs - c.rhs,
                ConstraintOp::Ge => c.rhs - lhs,
                ConstraintOp::Eq => (lhs - c.rhs).abs(),
            };
            Some(ConstraintViolation {
                constraint: c.name.clone(),
                required: c.rhs,
                actual: lhs,
                violation_amount,
            })
        })
        .collect();

    violations.sort_by(|a, b| b.violation_amount.total_cmp(&a.violation_amount));
    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::Sense;

    #[test]
    fn test_from_label_known() {
        assert_eq!(SolutionStatus::from_label("Optimal"), SolutionStatus::Optimal);
        assert_eq!(SolutionStatus::from_label(" infeasible "), SolutionStatus::Infeasible);
        assert_eq!(SolutionStatus::from_label("UNBOUNDED"), SolutionStatus::Unbounded);
    }

    #[test]
    fn test_from_label_unknown_is_error() {
        assert_eq!(SolutionStatus::from_label("Not Solved"), SolutionStatus::Error);
        assert_eq!(SolutionStatus::from_label("Undefined"), SolutionStatus::Error);
        assert_eq!(SolutionStatus::from_label(""), SolutionStatus::Error);
    }

    #[test]
    fn test_non_optimal_has_no_values() {
        let solution = Solution::infeasible(3);
        assert!(!solution.is_optimal());
        assert!(solution.values.is_empty());
        assert!(solution.message.is_some());
        assert_eq!(solution.nodes, 3);
    }

    #[test]
    fn test_non_optimal_solutions_compare_equal() {
        assert_eq!(Solution::infeasible(0), Solution::infeasible(0));
        assert_eq!(Solution::unbounded(2), Solution::unbounded(2));
        assert_eq!(Solution::error("limit", 1).objective_value, 0.0);
    }

    #[test]
    fn test_find_violations_sorted_worst_first() {
        let mut problem = LpProblem::continuous(["x", "y"], Sense::Maximize);
        problem.add_constraint("x_max", vec![1.0, 0.0], ConstraintOp::Le, 3.0);
        problem.add_constraint("y_min", vec![0.0, 1.0], ConstraintOp::Ge, 10.0);
        problem.add_constraint("sum", vec![1.0, 1.0], ConstraintOp::Eq, 9.0);

        let violations = find_violations(&problem, &[4.0, 5.0], 1e-9);

        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0].constraint, "y_min");
        assert!((violations[0].violation_amount - 5.0).abs() < 1e-9);
        assert_eq!(violations[1].constraint, "x_max");
    }
}
