//! Console and report rendering for planning results.

use std::fmt;

use prodplan_core::{ProblemData, SensitivityScenario, SolveResult};

/// Products and resources as loaded
pub struct Setup<'a>(pub &'a ProblemData);

impl fmt::Display for Setup<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.0;
        writeln!(f, "Products:")?;
        for p in &data.products {
            writeln!(f, "  {}:", p.id)?;
            writeln!(f, "    profit per unit  {:>10.2}", p.profit_per_unit)?;
            for (resource, rate) in &p.consumption {
                writeln!(f, "    {:16} {:>10.2}", resource, rate)?;
            }
            writeln!(f, "    demand           {:>4} .. {}", p.min_production, p.max_demand)?;
        }
        writeln!(f)?;
        writeln!(f, "Resources:")?;
        for r in &data.resources {
            writeln!(f, "  {:16} {:>10.2}", r.name, r.capacity)?;
        }
        Ok(())
    }
}

/// Solved quantities, utilization and row values
pub struct Results<'a>(pub &'a SolveResult);

impl fmt::Display for Results<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = self.0;
        writeln!(f, "Status: {}", result.status.label().to_uppercase())?;

        let Some(plan) = &result.plan else {
            if let Some(reason) = &result.reason {
                writeln!(f, "{}", reason)?;
            }
            return Ok(());
        };

        writeln!(f, "Total profit: {:.2}", plan.total_profit)?;
        writeln!(f)?;
        writeln!(f, "Production quantities:")?;
        for q in &plan.quantities {
            writeln!(f, "  {:12} {:5} units ({:.2} profit)", q.product, q.quantity, q.profit)?;
        }
        writeln!(f)?;
        writeln!(f, "Resource utilization:")?;
        for u in &plan.resource_usage {
            writeln!(
                f,
                "  {:16} {:8.1} / {:8.1} ({:5.1}%)",
                u.resource, u.used, u.available, u.utilization_percent
            )?;
        }
        writeln!(f)?;
        writeln!(f, "Constraint analysis:")?;
        for c in &plan.constraint_values {
            let marker = if c.is_binding(1e-6) { " (binding)" } else { "" };
            writeln!(
                f,
                "  {:28} {:10.2} {} {:<10.2}{}",
                c.id,
                c.value,
                c.op.symbol(),
                c.rhs,
                marker
            )?;
        }
        Ok(())
    }
}

/// Plain-text business summary of an optimal plan
pub struct BusinessReport<'a>(pub &'a SolveResult);

impl fmt::Display for BusinessReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "BUSINESS OPTIMIZATION REPORT")?;
        writeln!(f, "============================")?;
        writeln!(f)?;

        let Some(plan) = &self.0.plan else {
            writeln!(f, "No feasible production plan ({}).", self.0.status)?;
            if let Some(reason) = &self.0.reason {
                writeln!(f, "{}", reason)?;
            }
            return Ok(());
        };

        writeln!(f, "Executive summary:")?;
        writeln!(f, "------------------")?;
        writeln!(
            f,
            "The recommended production plan generates a total profit of {:.2}",
            plan.total_profit
        )?;
        writeln!(f, "while respecting every capacity, demand and contractual limit.")?;
        writeln!(f)?;

        writeln!(f, "Production recommendations:")?;
        writeln!(f, "---------------------------")?;
        for q in &plan.quantities {
            writeln!(f, "- {}: {} units ({:.2} contribution)", q.product, q.quantity, q.profit)?;
        }
        writeln!(f)?;

        writeln!(f, "Resource utilization:")?;
        writeln!(f, "---------------------")?;
        for u in &plan.resource_usage {
            writeln!(
                f,
                "- {}: {:.1}% utilized ({:.1}/{:.1})",
                u.resource, u.utilization_percent, u.used, u.available
            )?;
        }
        writeln!(f)?;

        if let Some(bottleneck) = plan.bottleneck() {
            writeln!(f, "Key insights:")?;
            writeln!(f, "-------------")?;
            writeln!(
                f,
                "- {} is the most constrained resource at {:.1}% utilization.",
                bottleneck.resource, bottleneck.utilization_percent
            )?;
            let binding: Vec<&str> = plan
                .constraint_values
                .iter()
                .filter(|c| c.is_binding(1e-6))
                .map(|c| c.id.as_str())
                .collect();
            if !binding.is_empty() {
                writeln!(f, "- Binding limits: {}.", binding.join(", "))?;
            }
        }
        Ok(())
    }
}

/// Total profit per scenario and its change against the first one
pub struct Sensitivity<'a>(pub &'a [SensitivityScenario]);

impl fmt::Display for Sensitivity<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(baseline) = self.0.first() else {
            return writeln!(f, "No scenarios.");
        };

        writeln!(f, "{:24} {:>12} {:>12}", "Scenario", "Profit", "Change")?;
        for scenario in self.0 {
            match scenario.result.total_profit() {
                Some(profit) => {
                    let delta = scenario
                        .profit_delta(baseline)
                        .map(|d| format!("{:+.2}", d))
                        .unwrap_or_else(|| "-".to_string());
                    writeln!(f, "{:24} {:>12.2} {:>12}", scenario.name, profit, delta)?;
                }
                None => writeln!(f, "{:24} {:>12} {:>12}", scenario.name, scenario.result.status, "-")?,
            }
        }
        Ok(())
    }
}
