//! Risk aggregation: percentile bands and failure probabilities across trials.
//!
//! Every statistic is computed over completed trials only. Failed trials
//! are counted in the report but contribute no values.

use crate::{
    config::ParameterSet,
    metric::Metric,
    statement::{MonthlyStatement, TrialResult},
    types::{Month, Seed},
};
use serde::{Deserialize, Serialize};

/// Percentile `p` (0..=100) of an ascending-sorted sample, interpolating
/// linearly between the order statistics around `p / 100 * (n - 1)`.
pub fn percentile(sorted: &[f64], p: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let rank = (p / 100.0).clamp(0.0, 1.0) * last as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let weight = rank - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * weight)
}

/// Sort `values` in place and read off each requested percentile.
pub fn percentiles(values: &mut [f64], ps: &[f64]) -> Vec<f64> {
    values.sort_by(f64::total_cmp);
    ps.iter().filter_map(|p| percentile(values, *p)).collect()
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Population standard deviation.
fn std_dev(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    Some(var.sqrt())
}

/// One metric's distribution in one month. `values` line up with the
/// report's `percentiles`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PercentileBand {
    pub month:  Month,
    pub values: Vec<f64>,
    pub mean:   f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DscrBand {
    Computed {
        month:   Month,
        defined: usize,
        values:  Vec<f64>,
    },
    /// Too few trials had debt service due this month to trust percentiles.
    InsufficientSample {
        month:    Month,
        defined:  usize,
        required: usize,
    },
}

impl DscrBand {
    pub fn month(&self) -> Month {
        match self {
            Self::Computed { month, .. } | Self::InsufficientSample { month, .. } => *month,
        }
    }

    pub fn values(&self) -> Option<&[f64]> {
        match self {
            Self::Computed { values, .. } => Some(values.as_slice()),
            Self::InsufficientSample { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskMetrics {
    /// Share of completed trials whose cash balance went negative in any month.
    pub probability_cash_out:    Metric,
    /// Share of completed trials with a defined DSCR below the breach
    /// threshold in any month.
    pub probability_dscr_breach: Metric,
    pub dscr_breach_threshold:   f64,
    pub final_cash_mean:         Metric,
    pub final_cash_std_dev:      Metric,
    /// Percentiles of each trial's lowest month-end cash balance.
    pub minimum_cash:            Vec<f64>,
}

/// Everything a run produces, in a form that serializes to plain JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateReport {
    pub scenario_name:    String,
    pub scenario_seed:    Seed,
    pub horizon_months:   Month,
    pub percentiles:      Vec<f64>,
    pub trials_requested: u64,
    pub trials_completed: u64,
    pub trials_failed:    u64,
    pub cancelled:        bool,
    pub cumulative_cash:  Vec<PercentileBand>,
    pub revenue:          Vec<PercentileBand>,
    pub net_cash_flow:    Vec<PercentileBand>,
    pub active_members:   Vec<PercentileBand>,
    pub dscr:             Vec<DscrBand>,
    pub risk:             RiskMetrics,
}

impl AggregateReport {
    /// Aggregate completed trials. `results` must be in trial-index order
    /// for the report to be reproducible bit for bit.
    pub fn build(
        params: &ParameterSet,
        results: &[TrialResult],
        trials_failed: u64,
        cancelled: bool,
    ) -> Self {
        let sim = params.simulation();
        let ps = &sim.percentiles;
        let horizon = if results.is_empty() { 0 } else { params.horizon() };

        let dscr = (1..=horizon)
            .map(|month| {
                let mut defined: Vec<f64> = results
                    .iter()
                    .filter_map(|r| statement(r, month).and_then(|s| s.dscr.value()))
                    .collect();
                if defined.len() < sim.min_dscr_sample {
                    log::debug!(
                        "month {month}: {} defined DSCR values, need {}; band left undefined",
                        defined.len(),
                        sim.min_dscr_sample
                    );
                    DscrBand::InsufficientSample {
                        month,
                        defined:  defined.len(),
                        required: sim.min_dscr_sample,
                    }
                } else {
                    DscrBand::Computed {
                        month,
                        defined: defined.len(),
                        values:  percentiles(&mut defined, ps),
                    }
                }
            })
            .collect();

        let completed = results.len();
        let fraction = |count: usize| Metric::ratio(count as f64, completed as f64);
        let final_cash: Vec<f64> = results.iter().filter_map(TrialResult::final_cash).collect();
        let mut minimum_cash: Vec<f64> =
            results.iter().filter_map(TrialResult::minimum_cash).collect();

        let risk = RiskMetrics {
            probability_cash_out:    fraction(
                results.iter().filter(|r| r.cash_out_month().is_some()).count(),
            ),
            probability_dscr_breach: fraction(
                results.iter().filter(|r| r.breaches_dscr(sim.dscr_breach_threshold)).count(),
            ),
            dscr_breach_threshold:   sim.dscr_breach_threshold,
            final_cash_mean:         mean(&final_cash).into(),
            final_cash_std_dev:      std_dev(&final_cash).into(),
            minimum_cash:            percentiles(&mut minimum_cash, ps),
        };

        Self {
            scenario_name:    params.config().name.clone(),
            scenario_seed:    params.seed(),
            horizon_months:   params.horizon(),
            percentiles:      ps.clone(),
            trials_requested: params.trials() as u64,
            trials_completed: completed as u64,
            trials_failed,
            cancelled,
            cumulative_cash:  bands(results, horizon, ps, |s| s.cumulative_cash),
            revenue:          bands(results, horizon, ps, |s| s.total_revenue),
            net_cash_flow:    bands(results, horizon, ps, |s| s.net_cash_flow),
            active_members:   bands(results, horizon, ps, |s| s.active_members() as f64),
            dscr,
            risk,
        }
    }

    /// Value of percentile `p` in `bands` for `month`, if `p` was requested.
    pub fn lookup(&self, bands: &[PercentileBand], month: Month, p: f64) -> Option<f64> {
        let idx = self.percentiles.iter().position(|q| *q == p)?;
        bands.iter().find(|b| b.month == month)?.values.get(idx).copied()
    }

    pub fn cash_percentile(&self, month: Month, p: f64) -> Option<f64> {
        self.lookup(&self.cumulative_cash, month, p)
    }
}

fn statement(result: &TrialResult, month: Month) -> Option<&MonthlyStatement> {
    month.checked_sub(1).and_then(|i| result.statements.get(i as usize))
}

/// One band per month for `metric`, over every completed trial.
fn bands(
    results: &[TrialResult],
    horizon: Month,
    ps: &[f64],
    metric: impl Fn(&MonthlyStatement) -> f64,
) -> Vec<PercentileBand> {
    (1..=horizon)
        .map(|month| {
            let mut values: Vec<f64> =
                results.iter().filter_map(|r| statement(r, month).map(&metric)).collect();
            PercentileBand {
                month,
                mean: mean(&values).unwrap_or(0.0),
                values: percentiles(&mut values, ps),
            }
        })
        .collect()
}
