//! Member dynamics: archetype-level acquisition and churn.
//!
//! Archetypes are tracked as counts, never as individual members.
//! Each month, per archetype:
//!   1. Churn thins the existing population with one binomial draw
//!      (statistically identical to flipping a coin per member).
//!   2. New acquisitions are drawn from the archetype's distribution,
//!      scaled by the seasonal multiplier, rounded and clamped to >= 0.
//!   3. Program attendees converted last month are added.
//!   4. If the studio has a membership cap, newcomers are admitted in
//!      archetype order until the cap is reached; the rest are dropped.

use crate::{
    config::{AcquisitionDistribution, ArchetypeConfig},
    error::TrialError,
    rng::TrialRng,
    types::Month,
};
use serde::{Deserialize, Serialize};

/// One archetype's realized month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchetypeMonth {
    pub archetype:   String,
    /// Members at the start of the month, before churn.
    pub opening:     u64,
    pub churned:     u64,
    pub acquired:    u64,
    /// Of `acquired`, how many came from program conversions.
    pub converted:   u64,
    /// Members turned away by the membership cap.
    pub turned_away: u64,
    pub active:      u64,
}

/// Draw one month's raw acquisition count.
pub fn draw_acquisitions(
    dist: &AcquisitionDistribution,
    multiplier: f64,
    rng: &mut TrialRng,
) -> u64 {
    match dist {
        AcquisitionDistribution::Poisson { mean } => rng.poisson(mean * multiplier),
        AcquisitionDistribution::Normal { mean, std_dev } => {
            whole_count(rng.normal(mean * multiplier, std_dev * multiplier))
        }
        AcquisitionDistribution::Triangular { min, mode, max } => {
            whole_count(rng.triangular(*min, *mode, *max) * multiplier)
        }
    }
}

fn whole_count(raw: f64) -> u64 {
    if raw.is_finite() {
        raw.round().max(0.0) as u64
    } else {
        0
    }
}

/// Members remaining after each of `active` leaves independently with
/// probability `churn`.
pub fn survivors(active: u64, churn: f64, rng: &mut TrialRng) -> u64 {
    active - rng.binomial(active, churn)
}

/// Sum of per-archetype counts, `None` if it does not fit in a `u64`.
pub fn checked_total(counts: impl IntoIterator<Item = u64>) -> Option<u64> {
    counts.into_iter().try_fold(0u64, |acc, n| acc.checked_add(n))
}

/// Population state of one trial.
pub struct MemberDynamics<'a> {
    archetypes:  &'a [ArchetypeConfig],
    max_members: Option<u64>,
    active:      Vec<u64>,
}

impl<'a> MemberDynamics<'a> {
    pub fn new(archetypes: &'a [ArchetypeConfig], max_members: Option<u64>) -> Self {
        Self {
            archetypes,
            max_members,
            active: archetypes.iter().map(|a| a.initial_members).collect(),
        }
    }

    /// Active members per archetype, in configuration order.
    pub fn active(&self) -> &[u64] {
        &self.active
    }

    /// Studio-wide active members. `step` refuses any month whose total
    /// would not fit in a `u64`, so this never saturates after a successful step.
    pub fn total_active(&self) -> u64 {
        self.active.iter().fold(0u64, |acc, n| acc.saturating_add(*n))
    }

    /// Advance one month. `conversions[i]` are attendees joining archetype `i`.
    pub fn step(
        &mut self,
        month: Month,
        acquisition_multiplier: f64,
        conversions: &[u64],
        rng: &mut TrialRng,
    ) -> Result<Vec<ArchetypeMonth>, TrialError> {
        let overflow = || TrialError::Overflow { month, field: "active_members" };

        let mut months = Vec::with_capacity(self.archetypes.len());
        for (i, archetype) in self.archetypes.iter().enumerate() {
            let opening = self.active[i];
            let kept = survivors(opening, archetype.monthly_churn, rng);
            let drawn = draw_acquisitions(&archetype.acquisition, acquisition_multiplier, rng);
            let converted = conversions.get(i).copied().unwrap_or(0);
            months.push(ArchetypeMonth {
                archetype:   archetype.name.clone(),
                opening,
                churned:     opening - kept,
                acquired:    drawn.checked_add(converted).ok_or_else(overflow)?,
                converted,
                turned_away: 0,
                active:      kept,
            });
        }

        let retained = checked_total(months.iter().map(|m| m.active)).ok_or_else(overflow)?;
        let mut room = match self.max_members {
            Some(cap) => cap.saturating_sub(retained),
            None      => u64::MAX,
        };
        for (i, m) in months.iter_mut().enumerate() {
            let admitted = m.acquired.min(room);
            room -= admitted;
            m.turned_away = m.acquired - admitted;
            m.converted = m.converted.min(admitted);
            m.acquired = admitted;
            m.active = m.active.checked_add(admitted).ok_or_else(overflow)?;
            self.active[i] = m.active;
        }
        checked_total(months.iter().map(|m| m.active)).ok_or_else(overflow)?;

        Ok(months)
    }
}
