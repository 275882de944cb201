//! Capacity model: station-time supply against member and program demand.
//!
//! Members are served first: their visits consume station time but their
//! dues are never throttled. Programs share whatever is left according to
//! the studio's throttle policy. Demand that does not fit is dropped;
//! nothing carries over to the next month.

use crate::{
    config::{ArchetypeConfig, StudioConfig, ThrottlePolicy},
    metric::Metric,
};
use serde::{Deserialize, Serialize};

/// A usage-based program's request for station time this month.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgramRequest {
    pub station:        usize,
    pub hours_per_unit: f64,
    pub units_demanded: u64,
}

/// Realized load on one station type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationUtilization {
    pub station_type:            String,
    pub available_hours:         f64,
    pub member_hours:            f64,
    /// Program hours actually granted.
    pub program_hours:           f64,
    /// Program hours requested before throttling.
    pub requested_program_hours: f64,
    /// Used hours over available hours, clamped to [0, 1].
    pub utilization:             f64,
    /// Requested hours (members + programs) over available hours, unclamped.
    pub demand_pressure:         Metric,
}

/// Outcome of one month's allocation.
#[derive(Debug, Clone, PartialEq)]
pub struct CapacityPlan {
    pub stations:      Vec<StationUtilization>,
    /// Granted units per request, in request order.
    pub granted_units: Vec<u64>,
}

impl CapacityPlan {
    pub fn used_hours(&self) -> f64 {
        self.stations.iter().map(|s| s.member_hours + s.program_hours).sum()
    }
}

pub struct CapacityModel {
    station_types:   Vec<String>,
    available_hours: Vec<f64>,
    policy:          ThrottlePolicy,
}

impl CapacityModel {
    pub fn new(studio: &StudioConfig) -> Self {
        let hours_per_station = studio.open_hours_per_week * studio.weeks_per_month;
        Self {
            station_types:   studio.stations.iter().map(|s| s.station_type.clone()).collect(),
            available_hours: studio
                .stations
                .iter()
                .map(|s| s.count as f64 * hours_per_station)
                .collect(),
            policy:          studio.throttle_policy,
        }
    }

    /// Index of a station type. Validated configs always resolve.
    pub fn station_index(&self, station_type: &str) -> Option<usize> {
        self.station_types.iter().position(|s| s == station_type)
    }

    pub fn available_hours(&self) -> &[f64] {
        &self.available_hours
    }

    /// Station hours requested by member visits, per station type.
    pub fn member_hours(&self, archetypes: &[ArchetypeConfig], active: &[u64]) -> Vec<f64> {
        let mut hours = vec![0.0; self.station_types.len()];
        for (archetype, count) in archetypes.iter().zip(active) {
            if let Some(idx) = self.station_index(&archetype.station_type) {
                hours[idx] += *count as f64 * archetype.visits_per_month * archetype.hours_per_visit;
            }
        }
        hours
    }

    /// Grant program requests against the hours members leave free.
    /// Granted units are whole attendees, floored, so granted program
    /// hours never exceed the free hours on their station.
    pub fn allocate(&self, member_hours: &[f64], requests: &[ProgramRequest]) -> CapacityPlan {
        let mut free: Vec<f64> = self
            .available_hours
            .iter()
            .zip(member_hours)
            .map(|(avail, used)| (avail - used).max(0.0))
            .collect();

        let granted_units = match self.policy {
            ThrottlePolicy::Priority     => grant_in_order(&mut free, requests),
            ThrottlePolicy::Proportional => grant_proportionally(&mut free, requests),
        };

        let stations = self
            .station_types
            .iter()
            .enumerate()
            .map(|(idx, station_type)| {
                let available = self.available_hours[idx];
                let members = member_hours[idx];
                let (requested, granted) = requests
                    .iter()
                    .zip(&granted_units)
                    .filter(|(r, _)| r.station == idx)
                    .fold((0.0, 0.0), |(req, got), (r, units)| {
                        (
                            req + r.units_demanded as f64 * r.hours_per_unit,
                            got + *units as f64 * r.hours_per_unit,
                        )
                    });
                let utilization = if available > 0.0 {
                    ((members + granted) / available).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                StationUtilization {
                    station_type:            station_type.clone(),
                    available_hours:         available,
                    member_hours:            members,
                    program_hours:           granted,
                    requested_program_hours: requested,
                    utilization,
                    demand_pressure:         Metric::ratio(members + requested, available),
                }
            })
            .collect();

        CapacityPlan { stations, granted_units }
    }
}

/// Whole units of `hours_per_unit` that fit in `free` hours.
fn units_that_fit(free: f64, hours_per_unit: f64) -> u64 {
    if hours_per_unit <= 0.0 {
        u64::MAX
    } else {
        (free / hours_per_unit).floor().max(0.0) as u64
    }
}

fn grant_in_order(free: &mut [f64], requests: &[ProgramRequest]) -> Vec<u64> {
    requests
        .iter()
        .map(|r| {
            let granted = r.units_demanded.min(units_that_fit(free[r.station], r.hours_per_unit));
            free[r.station] = (free[r.station] - granted as f64 * r.hours_per_unit).max(0.0);
            granted
        })
        .collect()
}

fn grant_proportionally(free: &mut [f64], requests: &[ProgramRequest]) -> Vec<u64> {
    let mut requested = vec![0.0; free.len()];
    for r in requests {
        requested[r.station] += r.units_demanded as f64 * r.hours_per_unit;
    }
    let share: Vec<f64> = free
        .iter()
        .zip(&requested)
        .map(|(f, req)| if *req <= *f { 1.0 } else { f / req })
        .collect();

    requests
        .iter()
        .map(|r| {
            let scaled = (r.units_demanded as f64 * share[r.station]).floor() as u64;
            let granted = scaled
                .min(r.units_demanded)
                .min(units_that_fit(free[r.station], r.hours_per_unit));
            free[r.station] = (free[r.station] - granted as f64 * r.hours_per_unit).max(0.0);
            granted
        })
        .collect()
}
