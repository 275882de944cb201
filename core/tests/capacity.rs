//! Station-time supply, member-first allocation and program throttling.

use studio_core::{
    capacity::{CapacityModel, ProgramRequest},
    config::{StationConfig, StudioConfig, ThrottlePolicy},
    metric::Metric,
};

const EPS: f64 = 1e-9;

/// One wheel station open 100 hours over a 1-week month: 100 hours.
fn studio(policy: ThrottlePolicy) -> StudioConfig {
    StudioConfig {
        stations:            vec![
            StationConfig { station_type: "wheel".into(), count: 1 },
            StationConfig { station_type: "kiln".into(),  count: 0 },
        ],
        open_hours_per_week: 100.0,
        weeks_per_month:     1.0,
        max_members:         None,
        throttle_policy:     policy,
    }
}

fn request(units: u64, hours: f64) -> ProgramRequest {
    ProgramRequest { station: 0, hours_per_unit: hours, units_demanded: units }
}

#[test]
fn available_hours_are_stations_times_open_time() {
    let config = StudioConfig {
        stations:            vec![StationConfig { station_type: "wheel".into(), count: 8 }],
        open_hours_per_week: 70.0,
        weeks_per_month:     52.0 / 12.0,
        max_members:         None,
        throttle_policy:     ThrottlePolicy::Priority,
    };
    let model = CapacityModel::new(&config);
    assert!((model.available_hours()[0] - 8.0 * 70.0 * 52.0 / 12.0).abs() < EPS);
}

#[test]
fn demand_within_capacity_is_fully_granted() {
    let model = CapacityModel::new(&studio(ThrottlePolicy::Priority));
    let plan = model.allocate(&[40.0, 0.0], &[request(5, 4.0), request(3, 2.0)]);
    assert_eq!(plan.granted_units, vec![5, 3]);
    let wheel = &plan.stations[0];
    assert!((wheel.program_hours - 26.0).abs() < EPS);
    assert!((wheel.utilization - 0.66).abs() < EPS);
    assert_eq!(wheel.demand_pressure, Metric::Defined(0.66));
}

#[test]
fn members_saturating_stations_leave_programs_nothing() {
    let model = CapacityModel::new(&studio(ThrottlePolicy::Priority));
    let plan = model.allocate(&[130.0, 0.0], &[request(4, 3.0)]);
    assert_eq!(plan.granted_units, vec![0]);
    let wheel = &plan.stations[0];
    assert_eq!(wheel.utilization, 1.0);
    assert!((wheel.demand_pressure.value().unwrap() - 1.42).abs() < EPS);
    assert!((wheel.requested_program_hours - 12.0).abs() < EPS);
}

#[test]
fn priority_serves_earlier_programs_first() {
    let model = CapacityModel::new(&studio(ThrottlePolicy::Priority));
    // 60 free hours: classes want 40, workshops want 40.
    let plan = model.allocate(&[40.0, 0.0], &[request(10, 4.0), request(20, 2.0)]);
    assert_eq!(plan.granted_units, vec![10, 10]);
}

#[test]
fn proportional_scales_every_program_alike() {
    let model = CapacityModel::new(&studio(ThrottlePolicy::Proportional));
    let plan = model.allocate(&[40.0, 0.0], &[request(10, 4.0), request(20, 2.0)]);
    // 60 of 80 requested hours fit: each program gets 75% of its units.
    assert_eq!(plan.granted_units, vec![7, 15]);
    assert!(plan.stations[0].program_hours <= 60.0 + EPS);
}

#[test]
fn partial_units_are_floored() {
    let model = CapacityModel::new(&studio(ThrottlePolicy::Priority));
    let plan = model.allocate(&[91.0, 0.0], &[request(5, 2.0)]);
    // 9 free hours fit four 2-hour attendees.
    assert_eq!(plan.granted_units, vec![4]);
}

#[test]
fn granted_hours_never_exceed_free_hours() {
    for policy in [ThrottlePolicy::Priority, ThrottlePolicy::Proportional] {
        let model = CapacityModel::new(&studio(policy));
        for member_hours in [0.0, 25.5, 50.0, 99.0, 100.0] {
            let requests = [request(17, 3.5), request(31, 1.25), request(9, 6.0)];
            let plan = model.allocate(&[member_hours, 0.0], &requests);
            let wheel = &plan.stations[0];
            assert!(
                wheel.member_hours + wheel.program_hours <= wheel.available_hours + EPS,
                "{policy:?} with {member_hours} member hours over-allocated"
            );
            assert!((0.0..=1.0).contains(&wheel.utilization));
            for (granted, r) in plan.granted_units.iter().zip(&requests) {
                assert!(*granted <= r.units_demanded);
            }
        }
    }
}

#[test]
fn station_with_no_hours_has_undefined_pressure() {
    let model = CapacityModel::new(&studio(ThrottlePolicy::Priority));
    let kiln = ProgramRequest { station: 1, hours_per_unit: 1.0, units_demanded: 3 };
    let plan = model.allocate(&[0.0, 0.0], &[kiln]);
    assert_eq!(plan.granted_units, vec![0]);
    assert_eq!(plan.stations[1].utilization, 0.0);
    assert_eq!(plan.stations[1].demand_pressure, Metric::Undefined);
}

#[test]
fn member_hours_follow_archetype_station() {
    let model = CapacityModel::new(&studio(ThrottlePolicy::Priority));
    let params = studio_core::config::ParameterSet::default_test();
    // 50 hobbyists x 4 visits x 2 hours on the wheel.
    let hours = model.member_hours(params.archetypes(), &[50]);
    assert_eq!(hours, vec![400.0, 0.0]);
    assert_eq!(model.station_index("kiln"), Some(1));
    assert_eq!(model.station_index("glaze"), None);
}
