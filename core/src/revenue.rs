//! Revenue model: membership dues plus capacity-gated programs.
//!
//! Membership is recurring and never throttled. Classes, workshops and
//! events turn demand into attendance only as far as the capacity plan
//! grants station time, then into revenue at the program's unit price.

use crate::{
    capacity::{CapacityModel, CapacityPlan, ProgramRequest},
    config::{ArchetypeConfig, ParameterSet, ProgramConfig},
    error::ConfigError,
    rng::TrialRng,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevenueStream {
    Membership,
    Classes,
    Workshops,
    Events,
}

impl RevenueStream {
    /// Usage-based streams, in throttling priority order.
    pub const PROGRAMS: [RevenueStream; 3] =
        [RevenueStream::Classes, RevenueStream::Workshops, RevenueStream::Events];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Membership => "membership",
            Self::Classes    => "classes",
            Self::Workshops  => "workshops",
            Self::Events     => "events",
        }
    }

    fn participation(&self, archetype: &ArchetypeConfig) -> f64 {
        match self {
            Self::Membership => 0.0,
            Self::Classes    => archetype.participation.classes,
            Self::Workshops  => archetype.participation.workshops,
            Self::Events     => archetype.participation.events,
        }
    }
}

/// Demand and realized attendance for one program in one month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramAttendance {
    pub stream:   RevenueStream,
    pub demanded: u64,
    pub realized: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RevenueMonth {
    pub by_stream:   BTreeMap<RevenueStream, f64>,
    pub attendance:  Vec<ProgramAttendance>,
    /// New members joining next month, per archetype index.
    pub conversions: Vec<u64>,
}

impl RevenueMonth {
    pub fn total(&self) -> f64 {
        self.by_stream.values().sum()
    }
}

struct Program<'a> {
    stream:            RevenueStream,
    config:            &'a ProgramConfig,
    station:           usize,
    conversion_target: Option<usize>,
}

pub struct RevenueModel<'a> {
    archetypes: &'a [ArchetypeConfig],
    programs:   Vec<Program<'a>>,
}

impl<'a> RevenueModel<'a> {
    pub fn new(params: &'a ParameterSet, capacity: &CapacityModel) -> Result<Self, ConfigError> {
        let archetypes = params.archetypes();
        let configs = params.programs();
        let programs = RevenueStream::PROGRAMS
            .iter()
            .zip([&configs.classes, &configs.workshops, &configs.events])
            .map(|(stream, config)| -> Result<Program<'a>, ConfigError> {
                let station = capacity.station_index(&config.station_type).ok_or_else(|| {
                    ConfigError::UnknownStation {
                        field:        format!("programs.{}.station_type", stream.name()),
                        station_type: config.station_type.clone(),
                    }
                })?;
                let conversion_target = match &config.conversion_archetype {
                    Some(name) => Some(
                        archetypes.iter().position(|a| &a.name == name).ok_or_else(|| {
                            ConfigError::UnknownArchetype {
                                field:     format!("programs.{}.conversion_archetype", stream.name()),
                                archetype: name.clone(),
                            }
                        })?,
                    ),
                    None => None,
                };
                Ok(Program { stream: *stream, config, station, conversion_target })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { archetypes, programs })
    }

    /// Draw this month's program demand: Poisson public demand scaled by
    /// seasonality, plus Poisson member enrollments. Disabled programs
    /// request nothing.
    pub fn program_requests(
        &self,
        active: &[u64],
        demand_multiplier: f64,
        rng: &mut TrialRng,
    ) -> Vec<ProgramRequest> {
        self.programs
            .iter()
            .map(|p| {
                let units_demanded = if p.config.enabled {
                    let member_mean: f64 = self
                        .archetypes
                        .iter()
                        .zip(active)
                        .map(|(a, n)| *n as f64 * p.stream.participation(a))
                        .sum();
                    let public = rng.poisson(p.config.public_demand_mean * demand_multiplier);
                    let members = rng.poisson(member_mean);
                    public.saturating_add(members)
                } else {
                    0
                };
                ProgramRequest {
                    station:        p.station,
                    hours_per_unit: p.config.station_hours_per_unit,
                    units_demanded,
                }
            })
            .collect()
    }

    /// Price realized activity and draw next month's conversions.
    /// `requests` and `plan` must come from the same month.
    pub fn realize(
        &self,
        active: &[u64],
        requests: &[ProgramRequest],
        plan: &CapacityPlan,
        rng: &mut TrialRng,
    ) -> RevenueMonth {
        let mut by_stream = BTreeMap::new();
        let membership: f64 = self
            .archetypes
            .iter()
            .zip(active)
            .map(|(a, n)| *n as f64 * a.monthly_spend)
            .sum();
        by_stream.insert(RevenueStream::Membership, membership);

        let mut attendance = Vec::with_capacity(self.programs.len());
        let mut conversions = vec![0u64; self.archetypes.len()];
        for ((program, request), granted) in
            self.programs.iter().zip(requests).zip(&plan.granted_units)
        {
            let realized = *granted;
            by_stream.insert(program.stream, realized as f64 * program.config.price_per_unit);
            if let Some(target) = program.conversion_target {
                let joined = rng.binomial(realized, program.config.member_conversion_rate);
                conversions[target] = conversions[target].saturating_add(joined);
            }
            attendance.push(ProgramAttendance {
                stream:   program.stream,
                demanded: request.units_demanded,
                realized,
            });
        }

        RevenueMonth { by_stream, attendance, conversions }
    }

    /// Direct cost of realized attendance (instructors, materials).
    pub fn program_costs(&self, attendance: &[ProgramAttendance]) -> f64 {
        self.programs
            .iter()
            .zip(attendance)
            .map(|(p, a)| a.realized as f64 * p.config.unit_cost)
            .sum()
    }
}
