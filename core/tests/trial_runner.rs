//! Single-trial invariants: cash identity, member accounting, capacity.

use studio_core::{
    config::{ParameterSet, ScenarioConfig},
    metric::Metric,
    revenue::RevenueStream,
    trial::TrialRunner,
};

const EPS: f64 = 1e-6;

fn community(months: u32) -> ParameterSet {
    let mut config = ScenarioConfig::community_studio();
    config.simulation.horizon_months = months;
    ParameterSet::new(config).unwrap()
}

#[test]
fn statements_cover_every_month_in_order() {
    let params = community(24);
    let runner = TrialRunner::new(&params).unwrap();
    let result = runner.run(0).unwrap();
    assert_eq!(result.statements.len(), 24);
    for (i, s) in result.statements.iter().enumerate() {
        assert_eq!(s.month, i as u32 + 1);
    }
}

#[test]
fn cash_identity_holds_every_month() {
    let params = community(36);
    let runner = TrialRunner::new(&params).unwrap();
    for index in 0..20 {
        let result = runner.run(index).unwrap();
        let mut cash = params.simulation().starting_cash;
        for s in &result.statements {
            let revenue: f64 = s.revenue.values().sum();
            assert!((s.total_revenue - revenue).abs() < EPS);
            assert!((s.operating_expenses - s.expenses.total()).abs() < EPS);
            assert!((s.net_operating_income - (s.total_revenue - s.operating_expenses)).abs() < EPS);
            assert!((s.net_cash_flow - (s.net_operating_income - s.debt_service)).abs() < EPS);
            cash += s.net_cash_flow;
            assert!((s.cumulative_cash - cash).abs() < EPS, "trial {index} month {}", s.month);
        }
    }
}

#[test]
fn member_counts_carry_forward() {
    let params = community(36);
    let runner = TrialRunner::new(&params).unwrap();
    let result = runner.run(3).unwrap();
    let mut previous: Vec<u64> = params.archetypes().iter().map(|a| a.initial_members).collect();
    for s in &result.statements {
        for (m, prev) in s.members.iter().zip(&previous) {
            assert_eq!(m.opening, *prev);
            assert_eq!(m.active, m.opening - m.churned + m.acquired);
        }
        previous = s.members.iter().map(|m| m.active).collect();
        assert!(s.active_members() <= 120, "cap exceeded in month {}", s.month);
    }
}

#[test]
fn station_time_is_never_oversold() {
    let params = community(48);
    let runner = TrialRunner::new(&params).unwrap();
    for index in 0..10 {
        for s in &runner.run(index).unwrap().statements {
            for station in &s.stations {
                assert!((0.0..=1.0).contains(&station.utilization));
                let ceiling = station.available_hours.max(station.member_hours);
                assert!(station.member_hours + station.program_hours <= ceiling + EPS);
            }
        }
    }
}

#[test]
fn debt_service_follows_the_loan_schedules() {
    let params = community(12);
    let runner = TrialRunner::new(&params).unwrap();
    let result = runner.run(0).unwrap();
    for s in &result.statements {
        assert!((s.debt_service - runner.debt().debt_service(s.month)).abs() < EPS);
        let expected = s.net_operating_income / s.debt_service;
        assert!((s.dscr.value().unwrap() - expected).abs() < EPS);
    }
}

#[test]
fn no_loans_means_undefined_dscr() {
    let params = ParameterSet::default_test();
    let runner = TrialRunner::new(&params).unwrap();
    let result = runner.run(0).unwrap();
    for s in &result.statements {
        assert_eq!(s.debt_service, 0.0);
        assert_eq!(s.dscr, Metric::Undefined);
    }
    assert!(!result.breaches_dscr(1.0));
}

#[test]
fn test_studio_earns_membership_only() {
    let params = ParameterSet::default_test();
    let runner = TrialRunner::new(&params).unwrap();
    let result = runner.run(5).unwrap();
    for s in &result.statements {
        let dues = s.active_members() as f64 * 150.0;
        assert!((s.revenue_for(RevenueStream::Membership) - dues).abs() < EPS);
        assert_eq!(s.revenue_for(RevenueStream::Classes), 0.0);
        // No expenses are configured, so all revenue is cash.
        assert!((s.net_cash_flow - dues).abs() < EPS);
    }
    assert!(result.final_cash().unwrap() > 10_000.0);
    assert_eq!(result.cash_out_month(), None);
}

#[test]
fn trials_replay_from_their_index() {
    let params = community(24);
    let runner = TrialRunner::new(&params).unwrap();
    assert_eq!(runner.run(17).unwrap(), runner.run(17).unwrap());
    assert_ne!(runner.run(17).unwrap(), runner.run(18).unwrap());
}

#[test]
fn expensive_studio_runs_out_of_cash() {
    let mut config = ParameterSet::default_test().into_config();
    config.simulation.starting_cash = 0.0;
    config.expenses.fixed = vec![studio_core::config::FixedExpense {
        name:           "rent".into(),
        monthly_amount: 80_000.0,
    }];
    let params = ParameterSet::new(config).unwrap();
    let result = TrialRunner::new(&params).unwrap().run(0).unwrap();
    assert_eq!(result.cash_out_month(), Some(1));
    assert!(result.minimum_cash().unwrap() < -500_000.0);
}
