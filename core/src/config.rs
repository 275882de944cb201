//! Scenario configuration and the validated Parameter Set.
//!
//! RULE: the engine only ever sees a `ParameterSet`, and the only way to
//! build one is `ParameterSet::new`, which validates every field. The
//! hidden `default_test` fixture wraps a known-valid config. Nothing
//! downstream re-derives defaults or clamps out-of-range input.

use crate::{
    error::ConfigError,
    loan::AmortizationType,
    types::{Month, Seed},
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

pub const MONTHS_PER_YEAR: usize = 12;
pub const DEFAULT_WEEKS_PER_MONTH: f64 = 52.0 / 12.0;
/// Longest accepted loan term and simulation horizon (50 years).
pub const MAX_MONTHS: u32 = 600;
pub const PRESETS: [&str; 3] = ["community_studio", "beginner_friendly", "professional"];

// ── Studio ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationConfig {
    pub station_type: String,
    pub count:        u32,
}

/// How usage-based programs share station time left over after members.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThrottlePolicy {
    /// Classes first, then workshops, then events.
    #[default]
    Priority,
    /// Every program on a contended station gets the same share of its request.
    Proportional,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudioConfig {
    pub stations:            Vec<StationConfig>,
    pub open_hours_per_week: f64,
    #[serde(default = "default_weeks_per_month")]
    pub weeks_per_month:     f64,
    /// Studio-wide membership cap. Acquisitions beyond it are turned away.
    #[serde(default)]
    pub max_members:         Option<u64>,
    #[serde(default)]
    pub throttle_policy:     ThrottlePolicy,
}

fn default_weeks_per_month() -> f64 {
    DEFAULT_WEEKS_PER_MONTH
}

// ── Members ────────────────────────────────────────────────────────

/// Shape of the monthly new-member count for one archetype.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum AcquisitionDistribution {
    Poisson    { mean: f64 },
    Normal     { mean: f64, std_dev: f64 },
    Triangular { min: f64, mode: f64, max: f64 },
}

impl AcquisitionDistribution {
    pub fn mean(&self) -> f64 {
        match self {
            Self::Poisson { mean } | Self::Normal { mean, .. } => *mean,
            Self::Triangular { min, mode, max } => (min + mode + max) / 3.0,
        }
    }
}

/// Expected program enrollments per active member per month.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgramParticipation {
    #[serde(default)]
    pub classes:   f64,
    #[serde(default)]
    pub workshops: f64,
    #[serde(default)]
    pub events:    f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchetypeConfig {
    pub name:             String,
    pub initial_members:  u64,
    pub acquisition:      AcquisitionDistribution,
    pub monthly_churn:    f64,
    /// Recurring membership spend per active member per month.
    pub monthly_spend:    f64,
    pub visits_per_month: f64,
    pub hours_per_visit:  f64,
    pub station_type:     String,
    #[serde(default)]
    pub participation:    ProgramParticipation,
}

// ── Programs (usage-based revenue streams) ─────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramConfig {
    pub enabled:                bool,
    pub price_per_unit:         f64,
    /// Expected monthly attendees from outside the membership.
    pub public_demand_mean:     f64,
    pub station_type:           String,
    pub station_hours_per_unit: f64,
    #[serde(default)]
    pub unit_cost:              f64,
    /// Fraction of realized attendees who join the next month.
    #[serde(default)]
    pub member_conversion_rate: f64,
    #[serde(default)]
    pub conversion_archetype:   Option<String>,
}

impl ProgramConfig {
    pub fn disabled(station_type: &str) -> Self {
        Self {
            enabled:                false,
            price_per_unit:         0.0,
            public_demand_mean:     0.0,
            station_type:           station_type.into(),
            station_hours_per_unit: 0.0,
            unit_cost:              0.0,
            member_conversion_rate: 0.0,
            conversion_archetype:   None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramsConfig {
    pub classes:   ProgramConfig,
    pub workshops: ProgramConfig,
    pub events:    ProgramConfig,
}

// ── Financing ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanConfig {
    pub name:                 String,
    pub principal:            f64,
    pub annual_rate:          f64,
    pub term_months:          u32,
    pub amortization:         AmortizationType,
    #[serde(default)]
    pub interest_only_months: u32,
}

// ── Expenses ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedExpense {
    pub name:           String,
    pub monthly_amount: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpenseConfig {
    #[serde(default)]
    pub fixed:                          Vec<FixedExpense>,
    #[serde(default)]
    pub annual_escalation:              f64,
    /// Std-dev of the multiplicative monthly shock on fixed costs.
    #[serde(default)]
    pub fixed_cost_volatility:          f64,
    #[serde(default)]
    pub variable_cost_per_member:       f64,
    #[serde(default)]
    pub variable_cost_per_station_hour: f64,
}

// ── Seasonality ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalityConfig {
    /// Calendar month (1 = January) of simulated month 1.
    pub start_month:             u32,
    pub acquisition_multipliers: Vec<f64>,
    pub demand_multipliers:      Vec<f64>,
}

impl Default for SeasonalityConfig {
    fn default() -> Self {
        Self {
            start_month:             1,
            acquisition_multipliers: vec![1.0; MONTHS_PER_YEAR],
            demand_multipliers:      vec![1.0; MONTHS_PER_YEAR],
        }
    }
}

impl SeasonalityConfig {
    fn calendar_index(&self, month: Month) -> usize {
        (self.start_month as usize - 1 + month.saturating_sub(1) as usize) % MONTHS_PER_YEAR
    }

    pub fn acquisition_multiplier(&self, month: Month) -> f64 {
        self.acquisition_multipliers[self.calendar_index(month)]
    }

    pub fn demand_multiplier(&self, month: Month) -> f64 {
        self.demand_multipliers[self.calendar_index(month)]
    }
}

// ── Simulation controls ────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationControls {
    pub horizon_months:        u32,
    pub trials:                u32,
    pub seed:                  Seed,
    pub starting_cash:         f64,
    #[serde(default = "default_percentiles")]
    pub percentiles:           Vec<f64>,
    #[serde(default = "default_min_dscr_sample")]
    pub min_dscr_sample:       usize,
    #[serde(default = "default_dscr_breach_threshold")]
    pub dscr_breach_threshold: f64,
    /// Worker threads. `None` uses the global rayon pool.
    #[serde(default)]
    pub threads:               Option<usize>,
}

fn default_percentiles() -> Vec<f64> {
    vec![5.0, 25.0, 50.0, 75.0, 95.0]
}

fn default_min_dscr_sample() -> usize {
    10
}

fn default_dscr_breach_threshold() -> f64 {
    1.0
}

// ── Scenario ───────────────────────────────────────────────────────

/// Raw, unvalidated scenario as read from disk or built in code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub name:        String,
    pub studio:      StudioConfig,
    pub archetypes:  Vec<ArchetypeConfig>,
    pub programs:    ProgramsConfig,
    #[serde(default)]
    pub loans:       Vec<LoanConfig>,
    #[serde(default)]
    pub expenses:    ExpenseConfig,
    #[serde(default)]
    pub seasonality: SeasonalityConfig,
    pub simulation:  SimulationControls,
}

impl ScenarioConfig {
    /// A community studio financed with an SBA 504 build-out loan and a 7(a)
    /// working-capital loan. Used by the runner when no file is given.
    pub fn community_studio() -> Self {
        let archetype = |name: &str,
                         initial: u64,
                         acq: f64,
                         churn: f64,
                         spend: f64,
                         visits: f64,
                         hours: f64,
                         station: &str,
                         classes: f64| ArchetypeConfig {
            name:             name.into(),
            initial_members:  initial,
            acquisition:      AcquisitionDistribution::Poisson { mean: acq },
            monthly_churn:    churn,
            monthly_spend:    spend,
            visits_per_month: visits,
            hours_per_visit:  hours,
            station_type:     station.into(),
            participation:    ProgramParticipation {
                classes,
                workshops: 0.02,
                events:    0.05,
            },
        };

        Self {
            name: "community_studio".into(),
            studio: StudioConfig {
                stations: vec![
                    StationConfig { station_type: "wheel".into(),       count: 8 },
                    StationConfig { station_type: "handbuilding".into(), count: 6 },
                    StationConfig { station_type: "glaze".into(),       count: 4 },
                ],
                open_hours_per_week: 70.0,
                weeks_per_month:     DEFAULT_WEEKS_PER_MONTH,
                max_members:         Some(120),
                throttle_policy:     ThrottlePolicy::Priority,
            },
            archetypes: vec![
                archetype("hobbyist",          12, 2.5, 0.045, 165.0, 4.0,  2.5, "wheel",        0.05),
                archetype("committed_artist",   8, 1.5, 0.025, 185.0, 8.0,  3.0, "wheel",        0.02),
                archetype("production_potter",  3, 0.5, 0.015, 225.0, 12.0, 4.0, "wheel",        0.0),
                archetype("seasonal_user",      4, 1.0, 0.080, 150.0, 3.0,  2.0, "handbuilding", 0.08),
            ],
            programs: ProgramsConfig {
                classes: ProgramConfig {
                    enabled:                true,
                    price_per_unit:         300.0,
                    public_demand_mean:     18.0,
                    station_type:           "wheel".into(),
                    station_hours_per_unit: 12.0,
                    unit_cost:              90.0,
                    member_conversion_rate: 0.12,
                    conversion_archetype:   Some("hobbyist".into()),
                },
                workshops: ProgramConfig {
                    enabled:                true,
                    price_per_unit:         75.0,
                    public_demand_mean:     30.0,
                    station_type:           "handbuilding".into(),
                    station_hours_per_unit: 2.0,
                    unit_cost:              25.0,
                    member_conversion_rate: 0.10,
                    conversion_archetype:   Some("hobbyist".into()),
                },
                events: ProgramConfig {
                    enabled:                true,
                    price_per_unit:         45.0,
                    public_demand_mean:     25.0,
                    station_type:           "handbuilding".into(),
                    station_hours_per_unit: 1.5,
                    unit_cost:              15.0,
                    member_conversion_rate: 0.03,
                    conversion_archetype:   Some("seasonal_user".into()),
                },
            },
            loans: vec![
                LoanConfig {
                    name:                 "sba_504".into(),
                    principal:            120_000.0,
                    annual_rate:          0.065,
                    term_months:          240,
                    amortization:         AmortizationType::FullyAmortizing,
                    interest_only_months: 6,
                },
                LoanConfig {
                    name:                 "sba_7a".into(),
                    principal:            40_000.0,
                    annual_rate:          0.10,
                    term_months:          84,
                    amortization:         AmortizationType::FullyAmortizing,
                    interest_only_months: 0,
                },
            ],
            expenses: ExpenseConfig {
                fixed: vec![
                    FixedExpense { name: "rent".into(),       monthly_amount: 3_500.0 },
                    FixedExpense { name: "insurance".into(),  monthly_amount: 250.0 },
                    FixedExpense { name: "utilities".into(),  monthly_amount: 450.0 },
                    FixedExpense { name: "owner_draw".into(), monthly_amount: 2_000.0 },
                ],
                annual_escalation:              0.03,
                fixed_cost_volatility:          0.05,
                variable_cost_per_member:       12.0,
                variable_cost_per_station_hour: 0.35,
            },
            seasonality: SeasonalityConfig {
                start_month:             1,
                acquisition_multipliers: vec![1.3, 1.1, 1.0, 1.0, 0.9, 0.8, 0.7, 0.8, 1.2, 1.1, 1.0, 0.9],
                demand_multipliers:      vec![1.0, 1.0, 1.0, 1.0, 0.9, 0.8, 0.8, 0.8, 1.1, 1.1, 1.2, 1.4],
            },
            simulation: SimulationControls {
                horizon_months:        60,
                trials:                1_000,
                seed:                  42,
                starting_cash:         25_000.0,
                percentiles:           default_percentiles(),
                min_dscr_sample:       default_min_dscr_sample(),
                dscr_breach_threshold: default_dscr_breach_threshold(),
                threads:               None,
            },
        }
    }

    /// Community layout tilted toward newcomers: half the members are
    /// hobbyists, classes and workshops run busier, churn runs higher.
    pub fn beginner_friendly() -> Self {
        let mut config = Self::community_studio();
        config.name = "beginner_friendly".into();
        config.set_members(&[
            ("hobbyist",          16, 3.5),
            ("committed_artist",   6, 1.0),
            ("production_potter",  2, 0.3),
            ("seasonal_user",      8, 1.5),
        ]);
        let programs = &mut config.programs;
        programs.classes.public_demand_mean = 26.0;
        programs.workshops.public_demand_mean = 40.0;
        programs.classes.member_conversion_rate = 0.15;
        config
    }

    /// Production-oriented studio: few hobbyists, long member tenure,
    /// fewer classes and more wheel time sold to working potters.
    pub fn professional() -> Self {
        let mut config = Self::community_studio();
        config.name = "professional".into();
        config.set_members(&[
            ("hobbyist",           4, 0.8),
            ("committed_artist",  12, 1.8),
            ("production_potter",  8, 1.0),
            ("seasonal_user",      2, 0.4),
        ]);
        for archetype in &mut config.archetypes {
            archetype.monthly_churn *= 0.8;
            archetype.monthly_spend += 40.0;
        }
        let programs = &mut config.programs;
        programs.classes.public_demand_mean = 10.0;
        programs.workshops.public_demand_mean = 15.0;
        programs.events.enabled = false;
        config
    }

    /// Built-in scenario by name, one of `PRESETS`.
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "community_studio"  => Some(Self::community_studio()),
            "beginner_friendly" => Some(Self::beginner_friendly()),
            "professional"      => Some(Self::professional()),
            _ => None,
        }
    }

    /// Overwrite initial members and Poisson acquisition means by archetype name.
    fn set_members(&mut self, mix: &[(&str, u64, f64)]) {
        for (name, initial, acquisition) in mix {
            if let Some(a) = self.archetypes.iter_mut().find(|a| a.name == *name) {
                a.initial_members = *initial;
                a.acquisition = AcquisitionDistribution::Poisson { mean: *acquisition };
            }
        }
    }

    /// Small single-archetype scenario for tests: 12 months, no loans,
    /// programs disabled, 50 trials.
    pub fn test_studio() -> Self {
        Self {
            name: "test_studio".into(),
            studio: StudioConfig {
                stations: vec![StationConfig { station_type: "wheel".into(), count: 6 }],
                open_hours_per_week: 60.0,
                weeks_per_month:     DEFAULT_WEEKS_PER_MONTH,
                max_members:         None,
                throttle_policy:     ThrottlePolicy::Priority,
            },
            archetypes: vec![ArchetypeConfig {
                name:             "hobbyist".into(),
                initial_members:  50,
                acquisition:      AcquisitionDistribution::Poisson { mean: 3.0 },
                monthly_churn:    0.05,
                monthly_spend:    150.0,
                visits_per_month: 4.0,
                hours_per_visit:  2.0,
                station_type:     "wheel".into(),
                participation:    ProgramParticipation::default(),
            }],
            programs: ProgramsConfig {
                classes:   ProgramConfig::disabled("wheel"),
                workshops: ProgramConfig::disabled("wheel"),
                events:    ProgramConfig::disabled("wheel"),
            },
            loans:       Vec::new(),
            expenses:    ExpenseConfig::default(),
            seasonality: SeasonalityConfig::default(),
            simulation: SimulationControls {
                horizon_months:        12,
                trials:                50,
                seed:                  42,
                starting_cash:         10_000.0,
                percentiles:           default_percentiles(),
                min_dscr_sample:       default_min_dscr_sample(),
                dscr_breach_threshold: default_dscr_breach_threshold(),
                threads:               None,
            },
        }
    }
}

// ── Parameter Set ──────────────────────────────────────────────────

/// A validated, immutable scenario. Cheap to share by reference across
/// worker threads.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ParameterSet {
    config: ScenarioConfig,
}

impl ParameterSet {
    pub fn new(config: ScenarioConfig) -> Result<Self, ConfigError> {
        validate(&config)?;
        Ok(Self { config })
    }

    /// Load and validate a scenario JSON file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {}: {e}", path.display()))?;
        let config: ScenarioConfig = serde_json::from_str(&content)?;
        Ok(Self::new(config)?)
    }

    pub fn config(&self) -> &ScenarioConfig {
        &self.config
    }

    /// Unwrap back into a raw config, e.g. to apply overrides and revalidate.
    pub fn into_config(self) -> ScenarioConfig {
        self.config
    }

    pub fn studio(&self) -> &StudioConfig {
        &self.config.studio
    }

    pub fn archetypes(&self) -> &[ArchetypeConfig] {
        &self.config.archetypes
    }

    pub fn programs(&self) -> &ProgramsConfig {
        &self.config.programs
    }

    pub fn loans(&self) -> &[LoanConfig] {
        &self.config.loans
    }

    pub fn expenses(&self) -> &ExpenseConfig {
        &self.config.expenses
    }

    pub fn seasonality(&self) -> &SeasonalityConfig {
        &self.config.seasonality
    }

    pub fn simulation(&self) -> &SimulationControls {
        &self.config.simulation
    }

    pub fn horizon(&self) -> Month {
        self.config.simulation.horizon_months
    }

    pub fn trials(&self) -> u32 {
        self.config.simulation.trials
    }

    pub fn seed(&self) -> Seed {
        self.config.simulation.seed
    }

    /// Fixture for tests, see `ScenarioConfig::test_studio`. The fixture is
    /// known-valid; debug builds still run it through validation.
    #[doc(hidden)]
    pub fn default_test() -> Self {
        let config = ScenarioConfig::test_studio();
        debug_assert!(validate(&config).is_ok());
        Self { config }
    }
}

// ── Validation ─────────────────────────────────────────────────────

fn check_probability(field: impl Into<String>, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange { field: field.into(), value, min: 0.0, max: 1.0 })
    }
}

fn check_non_negative(field: impl Into<String>, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { field: field.into(), value })
    }
}

fn check_months(field: impl Into<String>, months: u32) -> Result<(), ConfigError> {
    if months <= MAX_MONTHS {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field: field.into(),
            value: months as f64,
            min:   0.0,
            max:   MAX_MONTHS as f64,
        })
    }
}

fn check_unique<'a>(
    field: &str,
    names: impl IntoIterator<Item = &'a str>,
) -> Result<HashSet<&'a str>, ConfigError> {
    let mut seen = HashSet::new();
    for name in names {
        if name.is_empty() {
            return Err(ConfigError::Empty { field: format!("{field} name") });
        }
        if !seen.insert(name) {
            return Err(ConfigError::Duplicate { field: field.into(), name: name.into() });
        }
    }
    Ok(seen)
}

fn validate(config: &ScenarioConfig) -> Result<(), ConfigError> {
    let studio = &config.studio;
    if studio.stations.is_empty() {
        return Err(ConfigError::Empty { field: "studio.stations".into() });
    }
    let station_types = check_unique(
        "station_type",
        studio.stations.iter().map(|s| s.station_type.as_str()),
    )?;
    check_non_negative("studio.open_hours_per_week", studio.open_hours_per_week)?;
    if studio.open_hours_per_week > 168.0 {
        return Err(ConfigError::OutOfRange {
            field: "studio.open_hours_per_week".into(),
            value: studio.open_hours_per_week,
            min:   0.0,
            max:   168.0,
        });
    }
    check_non_negative("studio.weeks_per_month", studio.weeks_per_month)?;
    if studio.weeks_per_month == 0.0 {
        return Err(ConfigError::NotPositive { field: "studio.weeks_per_month".into() });
    }

    if config.archetypes.is_empty() {
        return Err(ConfigError::Empty { field: "archetypes".into() });
    }
    let archetype_names = check_unique(
        "archetype",
        config.archetypes.iter().map(|a| a.name.as_str()),
    )?;
    for a in &config.archetypes {
        let field = |f: &str| format!("archetypes.{}.{f}", a.name);
        check_probability(field("monthly_churn"), a.monthly_churn)?;
        check_non_negative(field("monthly_spend"), a.monthly_spend)?;
        check_non_negative(field("visits_per_month"), a.visits_per_month)?;
        check_non_negative(field("hours_per_visit"), a.hours_per_visit)?;
        check_non_negative(field("participation.classes"), a.participation.classes)?;
        check_non_negative(field("participation.workshops"), a.participation.workshops)?;
        check_non_negative(field("participation.events"), a.participation.events)?;
        if !station_types.contains(a.station_type.as_str()) {
            return Err(ConfigError::UnknownStation {
                field:        field("station_type"),
                station_type: a.station_type.clone(),
            });
        }
        validate_acquisition(&field("acquisition"), &a.acquisition)?;
    }

    for (label, program) in [
        ("classes", &config.programs.classes),
        ("workshops", &config.programs.workshops),
        ("events", &config.programs.events),
    ] {
        let field = |f: &str| format!("programs.{label}.{f}");
        check_non_negative(field("price_per_unit"), program.price_per_unit)?;
        check_non_negative(field("public_demand_mean"), program.public_demand_mean)?;
        check_non_negative(field("station_hours_per_unit"), program.station_hours_per_unit)?;
        check_non_negative(field("unit_cost"), program.unit_cost)?;
        check_probability(field("member_conversion_rate"), program.member_conversion_rate)?;
        if !station_types.contains(program.station_type.as_str()) {
            return Err(ConfigError::UnknownStation {
                field:        field("station_type"),
                station_type: program.station_type.clone(),
            });
        }
        if let Some(target) = &program.conversion_archetype {
            if !archetype_names.contains(target.as_str()) {
                return Err(ConfigError::UnknownArchetype {
                    field:     field("conversion_archetype"),
                    archetype: target.clone(),
                });
            }
        }
    }

    check_unique("loan", config.loans.iter().map(|l| l.name.as_str()))?;
    for loan in &config.loans {
        let field = |f: &str| format!("loans.{}.{f}", loan.name);
        check_non_negative(field("principal"), loan.principal)?;
        check_probability(field("annual_rate"), loan.annual_rate)?;
        check_months(field("term_months"), loan.term_months)?;
        if loan.principal > 0.0 {
            if loan.term_months == 0 {
                return Err(ConfigError::NotPositive { field: field("term_months") });
            }
            if loan.interest_only_months >= loan.term_months {
                return Err(ConfigError::Invalid {
                    field:  field("interest_only_months"),
                    reason: format!(
                        "{} interest-only months leaves nothing to amortize over a {}-month term",
                        loan.interest_only_months, loan.term_months
                    ),
                });
            }
        }
    }

    let expenses = &config.expenses;
    for fixed in &expenses.fixed {
        check_non_negative(format!("expenses.fixed.{}", fixed.name), fixed.monthly_amount)?;
    }
    check_probability("expenses.annual_escalation", expenses.annual_escalation)?;
    check_probability("expenses.fixed_cost_volatility", expenses.fixed_cost_volatility)?;
    check_non_negative("expenses.variable_cost_per_member", expenses.variable_cost_per_member)?;
    check_non_negative(
        "expenses.variable_cost_per_station_hour",
        expenses.variable_cost_per_station_hour,
    )?;

    let seasonality = &config.seasonality;
    if !(1..=12).contains(&seasonality.start_month) {
        return Err(ConfigError::OutOfRange {
            field: "seasonality.start_month".into(),
            value: seasonality.start_month as f64,
            min:   1.0,
            max:   12.0,
        });
    }
    for (label, values) in [
        ("seasonality.acquisition_multipliers", &seasonality.acquisition_multipliers),
        ("seasonality.demand_multipliers", &seasonality.demand_multipliers),
    ] {
        if values.len() != MONTHS_PER_YEAR {
            return Err(ConfigError::WrongLength {
                field:    label.into(),
                expected: MONTHS_PER_YEAR,
                actual:   values.len(),
            });
        }
        for (i, v) in values.iter().enumerate() {
            check_non_negative(format!("{label}[{i}]"), *v)?;
        }
    }

    let sim = &config.simulation;
    if sim.horizon_months == 0 {
        return Err(ConfigError::NotPositive { field: "simulation.horizon_months".into() });
    }
    check_months("simulation.horizon_months", sim.horizon_months)?;
    if sim.trials == 0 {
        return Err(ConfigError::NotPositive { field: "simulation.trials".into() });
    }
    check_non_negative("simulation.starting_cash", sim.starting_cash)?;
    check_non_negative("simulation.dscr_breach_threshold", sim.dscr_breach_threshold)?;
    if sim.min_dscr_sample == 0 {
        return Err(ConfigError::NotPositive { field: "simulation.min_dscr_sample".into() });
    }
    if sim.threads == Some(0) {
        return Err(ConfigError::NotPositive { field: "simulation.threads".into() });
    }
    if sim.percentiles.is_empty() {
        return Err(ConfigError::Empty { field: "simulation.percentiles".into() });
    }
    for p in &sim.percentiles {
        if !(0.0..=100.0).contains(p) {
            return Err(ConfigError::OutOfRange {
                field: "simulation.percentiles".into(),
                value: *p,
                min:   0.0,
                max:   100.0,
            });
        }
    }
    if sim.percentiles.windows(2).any(|w| w[0] >= w[1]) {
        return Err(ConfigError::Invalid {
            field:  "simulation.percentiles".into(),
            reason: "must be strictly ascending".into(),
        });
    }

    Ok(())
}

fn validate_acquisition(field: &str, dist: &AcquisitionDistribution) -> Result<(), ConfigError> {
    match dist {
        AcquisitionDistribution::Poisson { mean } => {
            check_non_negative(format!("{field}.mean"), *mean)
        }
        AcquisitionDistribution::Normal { mean, std_dev } => {
            check_non_negative(format!("{field}.mean"), *mean)?;
            check_non_negative(format!("{field}.std_dev"), *std_dev)
        }
        AcquisitionDistribution::Triangular { min, mode, max } => {
            check_non_negative(format!("{field}.min"), *min)?;
            check_non_negative(format!("{field}.mode"), *mode)?;
            check_non_negative(format!("{field}.max"), *max)?;
            if min <= mode && mode <= max {
                Ok(())
            } else {
                Err(ConfigError::Invalid {
                    field:  field.into(),
                    reason: format!("triangular requires min <= mode <= max, got {min}/{mode}/{max}"),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seasonality_wraps_from_start_month() {
        let mut seasonality = SeasonalityConfig::default();
        seasonality.start_month = 11;
        seasonality.acquisition_multipliers[10] = 2.0; // November
        seasonality.acquisition_multipliers[0] = 0.5;  // January
        assert_eq!(seasonality.acquisition_multiplier(1), 2.0);
        assert_eq!(seasonality.acquisition_multiplier(3), 0.5);
        assert_eq!(seasonality.acquisition_multiplier(13), 2.0);
    }

    #[test]
    fn bundled_presets_validate() {
        for name in PRESETS {
            let config = ScenarioConfig::preset(name).unwrap();
            assert_eq!(config.name, name);
            assert!(ParameterSet::new(config).is_ok(), "{name}");
        }
        assert!(ScenarioConfig::preset("artisan_loft").is_none());
        let fixture = ParameterSet::default_test().into_config();
        assert!(ParameterSet::new(fixture).is_ok());
    }
}
