//! Per-month and per-trial outputs of the trial runner.

use crate::{
    capacity::StationUtilization,
    expenses::ExpenseBreakdown,
    members::ArchetypeMonth,
    metric::Metric,
    revenue::{ProgramAttendance, RevenueStream},
    types::{Month, Seed, TrialIndex},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One month's realized state within one trial. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyStatement {
    pub month:                Month,
    pub members:              Vec<ArchetypeMonth>,
    pub revenue:              BTreeMap<RevenueStream, f64>,
    pub total_revenue:        f64,
    pub attendance:           Vec<ProgramAttendance>,
    pub stations:             Vec<StationUtilization>,
    pub expenses:             ExpenseBreakdown,
    pub operating_expenses:   f64,
    pub net_operating_income: f64,
    pub debt_service:         f64,
    pub dscr:                 Metric,
    pub net_cash_flow:        f64,
    pub cumulative_cash:      f64,
}

impl MonthlyStatement {
    pub fn active_members(&self) -> u64 {
        self.members.iter().fold(0u64, |acc, m| acc.saturating_add(m.active))
    }

    pub fn revenue_for(&self, stream: RevenueStream) -> f64 {
        self.revenue.get(&stream).copied().unwrap_or(0.0)
    }
}

/// Every month of one seeded trial, in month order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialResult {
    pub trial_index: TrialIndex,
    pub seed:        Seed,
    pub statements:  Vec<MonthlyStatement>,
}

impl TrialResult {
    pub fn final_cash(&self) -> Option<f64> {
        self.statements.last().map(|s| s.cumulative_cash)
    }

    pub fn minimum_cash(&self) -> Option<f64> {
        self.statements.iter().map(|s| s.cumulative_cash).min_by(f64::total_cmp)
    }

    /// First month whose closing cash balance is negative.
    pub fn cash_out_month(&self) -> Option<Month> {
        self.statements.iter().find(|s| s.cumulative_cash < 0.0).map(|s| s.month)
    }

    /// True if any month has a defined DSCR below `threshold`.
    pub fn breaches_dscr(&self, threshold: f64) -> bool {
        self.statements
            .iter()
            .any(|s| s.dscr.value().is_some_and(|v| v < threshold))
    }
}
