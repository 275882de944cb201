//! Operating expenses: fixed obligations plus usage-driven costs.
//!
//! Fixed costs escalate once per completed year and take a multiplicative
//! monthly shock (utilities, repairs, supply prices). Debt service is not
//! an operating expense; the trial runner handles it separately.

use crate::{config::ExpenseConfig, rng::TrialRng, types::Month};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpenseBreakdown {
    pub fixed:    f64,
    pub variable: f64,
    pub program:  f64,
}

impl ExpenseBreakdown {
    pub fn total(&self) -> f64 {
        self.fixed + self.variable + self.program
    }
}

pub struct ExpenseModel<'a> {
    config:     &'a ExpenseConfig,
    base_fixed: f64,
}

impl<'a> ExpenseModel<'a> {
    pub fn new(config: &'a ExpenseConfig) -> Self {
        Self {
            config,
            base_fixed: config.fixed.iter().map(|f| f.monthly_amount).sum(),
        }
    }

    /// Fixed costs in `month` before the random shock.
    pub fn scheduled_fixed(&self, month: Month) -> f64 {
        let years_elapsed = month.saturating_sub(1) / 12;
        self.base_fixed * (1.0 + self.config.annual_escalation).powi(years_elapsed as i32)
    }

    pub fn month(
        &self,
        month: Month,
        active_members: u64,
        used_station_hours: f64,
        program_costs: f64,
        rng: &mut TrialRng,
    ) -> ExpenseBreakdown {
        let shock = rng.normal(1.0, self.config.fixed_cost_volatility).max(0.0);
        ExpenseBreakdown {
            fixed:    self.scheduled_fixed(month) * shock,
            variable: active_members as f64 * self.config.variable_cost_per_member
                + used_station_hours * self.config.variable_cost_per_station_hour,
            program:  program_costs,
        }
    }
}
