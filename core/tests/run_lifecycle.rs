//! Run lifecycle: horizon validation, row count and year labels,
//! the one-shot run phase, and the engine event log.

use wefe_core::{
    clock::RunPhase,
    config::SimConfig,
    engine::{simulate, validate_years, SimEngine},
    error::SimError,
};

#[test]
fn table_has_one_row_per_year_from_base_year() {
    let config = SimConfig::default_test().unwrap();
    let table = simulate("rows".into(), &config, 30).unwrap();

    assert_eq!(table.len(), 30);
    for (i, row) in table.iter().enumerate() {
        assert_eq!(
            row.year(),
            config.initial.year + i as i32,
            "Row {i} has the wrong year label"
        );
    }
}

#[test]
fn out_of_range_horizons_are_rejected() {
    let config = SimConfig::default_test().unwrap();
    for years in [0, -5, 101, 1_000] {
        match simulate("bad".into(), &config, years) {
            Err(SimError::InvalidYears { years: got }) => assert_eq!(got, years),
            other => panic!("years={years}: expected InvalidYears, got {other:?}"),
        }
    }
    assert!(validate_years(1).is_ok());
    assert!(validate_years(100).is_ok());
}

#[test]
fn one_year_run_equals_one_tick() {
    let config = SimConfig::default_test().unwrap();
    let table = simulate("one".into(), &config, 1).unwrap();
    assert_eq!(table.len(), 1);

    let mut engine = SimEngine::build("manual".into(), &config);
    engine.clock.start();
    let snapshot = engine.tick().unwrap();

    assert_eq!(table.rows[0], snapshot);
}

#[test]
fn engine_runs_only_once() {
    let mut engine = SimEngine::build_test("once".into()).unwrap();
    engine.run(3).unwrap();
    assert_eq!(engine.clock.phase, RunPhase::Completed);

    match engine.run(3) {
        Err(SimError::RunCompleted) => {}
        other => panic!("expected RunCompleted, got {other:?}"),
    }
}

#[test]
fn event_log_brackets_every_year() {
    let mut engine = SimEngine::build_test("events".into()).unwrap();
    engine.run(5).unwrap();

    let log = engine.event_log();
    assert_eq!(log[0].event_type, "run_initialized");
    let started = log.iter().filter(|e| e.event_type == "year_started").count();
    let completed = log.iter().filter(|e| e.event_type == "year_completed").count();
    assert_eq!(started, 5);
    assert_eq!(completed, 5);

    let year_2007 = engine.events_for_year(2007);
    assert_eq!(year_2007.first().map(|e| e.event_type.as_str()), Some("year_started"));
    assert_eq!(year_2007.last().map(|e| e.event_type.as_str()), Some("year_completed"));
    assert!(year_2007.iter().any(|e| e.subsystem == "macro"));
}

#[test]
fn regime_switch_is_logged_once() {
    let mut engine = SimEngine::build_test("regime".into()).unwrap();
    engine.run(20).unwrap();

    let switches: Vec<_> = engine
        .event_log()
        .iter()
        .filter(|e| e.event_type == "energy_regime_switched")
        .collect();
    assert_eq!(switches.len(), 1, "Expected exactly one regime switch");
    assert_eq!(switches[0].year, 2014);
}

#[test]
fn summary_covers_the_whole_run() {
    let config = SimConfig::default_test().unwrap();
    let table = simulate("summary".into(), &config, 10).unwrap();
    let summary = table.summary().expect("non-empty table");

    assert_eq!(summary.total_years, 10);
    assert_eq!(summary.start_year, 2005);
    assert_eq!(summary.end_year, 2014);
    let co2: f64 = table.iter().map(|r| r.ecology.total_co2).sum();
    assert!((summary.total_co2_emissions - co2).abs() < 1e-9);
    assert_eq!(summary.final_water_ratio, table.rows[9].water.water_ratio);
}
