//! Parameter Set validation: every bad field fails fast with a named error.

use studio_core::{
    config::{AcquisitionDistribution, LoanConfig, ParameterSet, ScenarioConfig, ThrottlePolicy},
    error::ConfigError,
    loan::AmortizationType,
};

fn base() -> ScenarioConfig {
    ParameterSet::default_test().into_config()
}

fn rejects(config: ScenarioConfig) -> ConfigError {
    ParameterSet::new(config).expect_err("config should have been rejected")
}

#[test]
fn churn_outside_unit_interval_is_rejected() {
    let mut config = base();
    config.archetypes[0].monthly_churn = 1.5;
    assert!(matches!(rejects(config), ConfigError::OutOfRange { field, .. } if field.ends_with("monthly_churn")));
}

#[test]
fn negative_money_is_rejected() {
    let mut config = base();
    config.archetypes[0].monthly_spend = -10.0;
    assert!(matches!(rejects(config), ConfigError::Negative { .. }));

    let mut config = base();
    config.simulation.starting_cash = f64::NAN;
    assert!(matches!(rejects(config), ConfigError::Negative { .. }));
}

#[test]
fn horizon_and_trials_must_be_positive() {
    let mut config = base();
    config.simulation.horizon_months = 0;
    assert_eq!(
        rejects(config),
        ConfigError::NotPositive { field: "simulation.horizon_months".into() }
    );

    let mut config = base();
    config.simulation.horizon_months = 601;
    assert!(matches!(
        rejects(config),
        ConfigError::OutOfRange { field, .. } if field == "simulation.horizon_months"
    ));

    let mut config = base();
    config.simulation.trials = 0;
    assert_eq!(rejects(config), ConfigError::NotPositive { field: "simulation.trials".into() });
}

#[test]
fn unknown_station_types_are_rejected() {
    let mut config = base();
    config.archetypes[0].station_type = "kiln".into();
    assert!(matches!(rejects(config), ConfigError::UnknownStation { station_type, .. } if station_type == "kiln"));

    let mut config = base();
    config.programs.events.station_type = "raku_pit".into();
    assert!(matches!(rejects(config), ConfigError::UnknownStation { .. }));
}

#[test]
fn duplicate_archetypes_are_rejected() {
    let mut config = base();
    let copy = config.archetypes[0].clone();
    config.archetypes.push(copy);
    assert!(matches!(rejects(config), ConfigError::Duplicate { name, .. } if name == "hobbyist"));
}

#[test]
fn conversion_target_must_exist() {
    let mut config = base();
    config.programs.classes.conversion_archetype = Some("ghost".into());
    assert!(matches!(rejects(config), ConfigError::UnknownArchetype { .. }));
}

#[test]
fn loan_terms_are_checked() {
    let loan = |term, io| LoanConfig {
        name:                 "sba".into(),
        principal:            50_000.0,
        annual_rate:          0.07,
        term_months:          term,
        amortization:         AmortizationType::FullyAmortizing,
        interest_only_months: io,
    };

    let mut config = base();
    config.loans = vec![loan(0, 0)];
    assert!(matches!(rejects(config), ConfigError::NotPositive { .. }));

    let mut config = base();
    config.loans = vec![loan(24, 24)];
    assert!(matches!(rejects(config), ConfigError::Invalid { .. }));

    let mut config = base();
    config.loans = vec![LoanConfig { annual_rate: 1.2, ..loan(24, 0) }];
    assert!(matches!(rejects(config), ConfigError::OutOfRange { .. }));

    let mut config = base();
    config.loans = vec![loan(u32::MAX, 0)];
    assert!(matches!(
        rejects(config),
        ConfigError::OutOfRange { field, max, .. } if field == "loans.sba.term_months" && max == 600.0
    ));

    let mut config = base();
    config.loans = vec![loan(600, 0)];
    assert!(ParameterSet::new(config).is_ok());

    // A zero-principal loan with no term is allowed and simply never bills.
    let mut config = base();
    config.loans = vec![LoanConfig { principal: 0.0, ..loan(0, 0) }];
    assert!(ParameterSet::new(config).is_ok());
}

#[test]
fn seasonality_needs_twelve_months() {
    let mut config = base();
    config.seasonality.demand_multipliers = vec![1.0; 11];
    assert_eq!(
        rejects(config),
        ConfigError::WrongLength {
            field:    "seasonality.demand_multipliers".into(),
            expected: 12,
            actual:   11,
        }
    );
}

#[test]
fn triangular_bounds_must_be_ordered() {
    let mut config = base();
    config.archetypes[0].acquisition = AcquisitionDistribution::Triangular { min: 3.0, mode: 1.0, max: 5.0 };
    assert!(matches!(rejects(config), ConfigError::Invalid { .. }));
}

#[test]
fn percentiles_must_ascend_within_range() {
    let mut config = base();
    config.simulation.percentiles = vec![50.0, 5.0];
    assert!(matches!(rejects(config), ConfigError::Invalid { .. }));

    let mut config = base();
    config.simulation.percentiles = vec![5.0, 105.0];
    assert!(matches!(rejects(config), ConfigError::OutOfRange { .. }));
}

#[test]
fn minimal_json_fills_defaults() {
    let json = r#"{
        "name": "tiny",
        "studio": {
            "stations": [{ "station_type": "wheel", "count": 2 }],
            "open_hours_per_week": 40.0
        },
        "archetypes": [{
            "name": "regular",
            "initial_members": 5,
            "acquisition": { "shape": "poisson", "mean": 1.0 },
            "monthly_churn": 0.05,
            "monthly_spend": 120.0,
            "visits_per_month": 4.0,
            "hours_per_visit": 2.0,
            "station_type": "wheel"
        }],
        "programs": {
            "classes":   { "enabled": false, "price_per_unit": 0.0, "public_demand_mean": 0.0, "station_type": "wheel", "station_hours_per_unit": 0.0 },
            "workshops": { "enabled": false, "price_per_unit": 0.0, "public_demand_mean": 0.0, "station_type": "wheel", "station_hours_per_unit": 0.0 },
            "events":    { "enabled": false, "price_per_unit": 0.0, "public_demand_mean": 0.0, "station_type": "wheel", "station_hours_per_unit": 0.0 }
        },
        "simulation": { "horizon_months": 6, "trials": 10, "seed": 1, "starting_cash": 0.0 }
    }"#;
    let config: ScenarioConfig = serde_json::from_str(json).unwrap();
    let params = ParameterSet::new(config).unwrap();
    assert_eq!(params.studio().throttle_policy, ThrottlePolicy::Priority);
    assert_eq!(params.studio().max_members, None);
    assert_eq!(params.simulation().percentiles, vec![5.0, 25.0, 50.0, 75.0, 95.0]);
    assert_eq!(params.simulation().min_dscr_sample, 10);
    assert!(params.loans().is_empty());
    assert_eq!(params.seasonality().start_month, 1);
}

#[test]
fn bundled_scenario_file_loads() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../data/scenarios/starter_studio.json");
    let params = ParameterSet::load(path).unwrap();
    assert_eq!(params.config().name, "starter_studio");
    assert_eq!(params.studio().throttle_policy, ThrottlePolicy::Proportional);
    assert_eq!(params.loans()[0].amortization, AmortizationType::FixedPrincipal);
    assert_eq!(params.archetypes().len(), 2);
}

#[test]
fn presets_differ_in_hobbyist_share() {
    let hobbyist_share = |name: &str| {
        let params = ParameterSet::new(ScenarioConfig::preset(name).unwrap()).unwrap();
        let total: u64 = params.archetypes().iter().map(|a| a.initial_members).sum();
        let hobbyists = params.archetypes().iter().find(|a| a.name == "hobbyist").unwrap();
        hobbyists.initial_members as f64 / total as f64
    };
    let beginner = hobbyist_share("beginner_friendly");
    let community = hobbyist_share("community_studio");
    let professional = hobbyist_share("professional");
    assert!(beginner > community && community > professional);
    assert!(beginner >= 0.5);
    assert!(professional <= 0.2);
}
