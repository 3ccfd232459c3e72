use crate::error::SolverError;
use crate::problem::{ConstraintOp, LpProblem, Sense};

/// Outcome of solving the continuous relaxation of a problem
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum LpOutcome {
    /// Values of the structural variables at an optimal vertex
    Optimal(Vec<f64>),
    Infeasible,
    Unbounded,
}

enum Pivoting {
    Optimal,
    Unbounded,
}

/// Two-phase dense simplex using Bland's rule, so degenerate vertices
/// (common with many bound rows) cannot cycle.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Simplex {
    /// Pivot limit per phase
    pub max_iterations: usize,
    /// Threshold below which a reduced cost or pivot entry counts as zero
    pub tolerance: f64,
    /// Largest artificial residue still accepted as feasible after phase 1
    pub feasibility_tolerance: f64,
}

impl Default for Simplex {
    fn default() -> Self {
        Self {
            max_iterations: 10_000,
            tolerance: 1e-9,
            feasibility_tolerance: 1e-7,
        }
    }
}

impl Simplex {
    /// Solve the continuous relaxation of `problem` (integrality is ignored)
    pub fn solve(&self, problem: &LpProblem) -> Result<LpOutcome, SolverError> {
        let mut tableau = Tableau::new(problem);

        if tableau.has_artificial() {
            tableau.load_phase1_objective();
            let all_columns = tableau.width;
            self.optimize(&mut tableau, all_columns)?;
            if !tableau.artificials_cleared(self.feasibility_tolerance) {
                return Ok(LpOutcome::Infeasible);
            }
            tableau.drive_out_artificials(self.tolerance);
        }

        tableau.load_objective(problem);
        let non_artificial = tableau.artificial_start;
        match self.optimize(&mut tableau, non_artificial)? {
            Pivoting::Optimal => Ok(LpOutcome::Optimal(tableau.structural_values(self.feasibility_tolerance))),
            Pivoting::Unbounded => Ok(LpOutcome::Unbounded),
        }
    }

    /// Pivot until no column below `column_limit` has a positive reduced cost
    fn optimize(&self, tableau: &mut Tableau, column_limit: usize) -> Result<Pivoting, SolverError> {
        for _ in 0..self.max_iterations {
            // Bland: lowest-index improving column
            let Some(col) = (0..column_limit).find(|&j| tableau.objective[j] > self.tolerance) else {
                return Ok(Pivoting::Optimal);
            };
            let Some(row) = self.leaving_row(tableau, col) else {
                return Ok(Pivoting::Unbounded);
            };
            tableau.pivot(row, col);
        }
        Err(SolverError::IterationLimit(self.max_iterations))
    }

    /// Minimum-ratio row for `col`, ties broken by lowest basic variable index
    fn leaving_row(&self, tableau: &Tableau, col: usize) -> Option<usize> {
        let rhs = tableau.width;
        let mut best: Option<(usize, f64)> = None;

        for (i, row) in tableau.rows.iter().enumerate() {
            let entry = row[col];
            if entry <= self.tolerance {
                continue;
            }
            let ratio = row[rhs] / entry;
            best = match best {
                None => Some((i, ratio)),
                Some((b, best_ratio)) => {
                    if ratio < best_ratio - self.tolerance
                        || (ratio <= best_ratio + self.tolerance && tableau.basis[i] < tableau.basis[b])
                    {
                        Some((i, ratio))
                    } else {
                        Some((b, best_ratio))
                    }
                }
            };
        }

        best.map(|(i, _)| i)
    }
}

/// Dense tableau. Columns are laid out as
/// `[structural | slack/surplus | artificial | rhs]`.
struct Tableau {
    rows: Vec<Vec<f64>>,
    /// Reduced costs of the current objective; the last entry tracks -z
    objective: Vec<f64>,
    basis: Vec<usize>,
    n_structural: usize,
    artificial_start: usize,
    /// Number of variable columns; also the index of the rhs column
    width: usize,
}

impl Tableau {
    fn new(problem: &LpProblem) -> Self {
        let n = problem.num_variables();

        // Normalize every row to a non-negative rhs, flipping the relation
        let normalized: Vec<(Vec<f64>, ConstraintOp, f64)> = problem
            .constraints
            .iter()
            .map(|c| {
                if c.rhs < 0.0 {
                    let op = match c.op {
                        ConstraintOp::Le => ConstraintOp::Ge,
                        ConstraintOp::Ge => ConstraintOp::Le,
                        ConstraintOp::Eq => ConstraintOp::Eq,
                    };
                    (c.coefficients.iter().map(|x| -x).collect(), op, -c.rhs)
                } else {
                    (c.coefficients.clone(), c.op, c.rhs)
                }
            })
            .collect();

        let n_slack = normalized.iter().filter(|(_, op, _)| *op != ConstraintOp::Eq).count();
        let n_artificial = normalized.iter().filter(|(_, op, _)| *op != ConstraintOp::Le).count();
        let artificial_start = n + n_slack;
        let width = artificial_start + n_artificial;

        let mut rows = Vec::with_capacity(normalized.len());
        let mut basis = Vec::with_capacity(normalized.len());
        let mut next_slack = n;
        let mut next_artificial = artificial_start;

        for (coefficients, op, rhs) in normalized {
            let mut row = vec![0.0; width + 1];
            row[..n].copy_from_slice(&coefficients);
            row[width] = rhs;

            match op {
                ConstraintOp::Le => {
                    row[next_slack] = 1.0;
                    basis.push(next_slack);
                    next_slack += 1;
                }
                ConstraintOp::Ge => {
                    row[next_slack] = -1.0;
                    next_slack += 1;
                    row[next_artificial] = 1.0;
                    basis.push(next_artificial);
                    next_artificial += 1;
                }
                ConstraintOp::Eq => {
                    row[next_artificial] = 1.0;
                    basis.push(next_artificial);
                    next_artificial += 1;
                }
            }
            rows.push(row);
        }

        Self {
            rows,
            objective: vec![0.0; width + 1],
            basis,
            n_structural: n,
            artificial_start,
            width,
        }
    }

    fn has_artificial(&self) -> bool {
        self.width > self.artificial_start
    }

    /// Maximize the negated sum of artificials, priced out against the
    /// rows where they start basic
    fn load_phase1_objective(&mut self) {
        self.objective.iter_mut().for_each(|v| *v = 0.0);
        for j in self.artificial_start..self.width {
            self.objective[j] = -1.0;
        }
        for (row, &basic) in self.rows.iter().zip(&self.basis) {
            if basic >= self.artificial_start {
                for (v, r) in self.objective.iter_mut().zip(row) {
                    *v += r;
                }
            }
        }
    }

    fn artificials_cleared(&self, tolerance: f64) -> bool {
        self.rows
            .iter()
            .zip(&self.basis)
            .filter(|&(_, &basic)| basic >= self.artificial_start)
            .all(|(row, _)| row[self.width].abs() <= tolerance)
    }

    /// Pivot zero-level artificials out of the basis. Rows with no usable
    /// entry are redundant and keep their artificial, which phase 2 never
    /// touches.
    fn drive_out_artificials(&mut self, tolerance: f64) {
        for i in 0..self.rows.len() {
            if self.basis[i] < self.artificial_start {
                continue;
            }
            if let Some(col) = (0..self.artificial_start).find(|&j| self.rows[i][j].abs() > tolerance) {
                self.pivot(i, col);
            }
        }
    }

    fn load_objective(&mut self, problem: &LpProblem) {
        let sign = match problem.objective.sense {
            Sense::Maximize => 1.0,
            Sense::Minimize => -1.0,
        };
        self.objective.iter_mut().for_each(|v| *v = 0.0);
        for (j, coef) in problem.objective.coefficients.iter().enumerate() {
            self.objective[j] = sign * coef;
        }
        for (row, &basic) in self.rows.iter().zip(&self.basis) {
            let factor = self.objective[basic];
            if factor != 0.0 {
                for (v, r) in self.objective.iter_mut().zip(row) {
                    *v -= factor * r;
                }
            }
        }
    }

    fn pivot(&mut self, row: usize, col: usize) {
        let pivot = self.rows[row][col];
        self.rows[row].iter_mut().for_each(|v| *v /= pivot);
        let pivot_row = self.rows[row].clone();

        for (i, other) in self.rows.iter_mut().enumerate() {
            if i == row {
                continue;
            }
            let factor = other[col];
            if factor != 0.0 {
                for (v, p) in other.iter_mut().zip(&pivot_row) {
                    *v -= factor * p;
                }
            }
        }

        let factor = self.objective[col];
        if factor != 0.0 {
            for (v, p) in self.objective.iter_mut().zip(&pivot_row) {
                *v -= factor * p;
            }
        }

        self.basis[row] = col;
    }

    fn structural_values(&self, tolerance: f64) -> Vec<f64> {
        let mut values = vec![0.0; self.n_structural];
        for (row, &basic) in self.rows.iter().zip(&self.basis) {
            if basic < self.n_structural {
                let value = row[self.width];
                // Snap round-off below zero back onto the bound
                values[basic] = if value.abs() <= tolerance { 0.0 } else { value };
            }
        }
        values
    }
}
