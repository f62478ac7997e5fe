//! THE MOST IMPORTANT TEST IN THE PROJECT.
//!
//! Two engines, same configuration, same horizon.
//! They must produce bit-identical result tables and event logs.
//! Any divergence is a blocker; do not merge until fixed.

use wefe_core::{config::SimConfig, engine::SimEngine};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn same_config_produces_identical_tables() {
    init_logging();
    const YEARS: u32 = 40;

    let config = SimConfig::default_test().unwrap();
    let mut engine_a = SimEngine::build("det-a".into(), &config);
    let mut engine_b = SimEngine::build("det-b".into(), &config);

    let table_a = engine_a.run(YEARS).expect("engine_a run");
    let table_b = engine_b.run(YEARS).expect("engine_b run");

    assert_eq!(table_a.len(), table_b.len());
    for (i, (a, b)) in table_a.iter().zip(table_b.iter()).enumerate() {
        let row_a = serde_json::to_string(a).unwrap();
        let row_b = serde_json::to_string(b).unwrap();
        assert_eq!(row_a, row_b, "Result table diverged at row {i}");
    }
    for (a, b) in table_a.iter().zip(table_b.iter()) {
        assert_eq!(a.energy.energy_supply.to_bits(), b.energy.energy_supply.to_bits());
        assert_eq!(a.ecology.total_co2.to_bits(), b.ecology.total_co2.to_bits());
    }
}

#[test]
fn same_config_produces_identical_event_logs() {
    let config = SimConfig::default_test().unwrap();
    let mut engine_a = SimEngine::build("det-log".into(), &config);
    let mut engine_b = SimEngine::build("det-log".into(), &config);

    engine_a.run(25).unwrap();
    engine_b.run(25).unwrap();

    let log_a: Vec<&str> = engine_a.event_log().iter().map(|e| e.payload.as_str()).collect();
    let log_b: Vec<&str> = engine_b.event_log().iter().map(|e| e.payload.as_str()).collect();

    assert_eq!(log_a.len(), log_b.len(), "Event log lengths differ");
    for (i, (a, b)) in log_a.iter().zip(log_b.iter()).enumerate() {
        assert_eq!(a, b, "Event log diverged at entry {i}:\n  A: {a}\n  B: {b}");
    }
}

#[test]
fn independent_engines_do_not_share_state() {
    let config = SimConfig::default_test().unwrap();
    let mut long = SimEngine::build("long".into(), &config);
    long.run(30).unwrap();

    // A second engine built afterwards still starts from the base year.
    let mut short = SimEngine::build("short".into(), &config);
    let table = short.run(1).unwrap();
    assert_eq!(table.rows[0].year(), config.initial.year);
    assert_eq!(short.state().year, config.initial.year + 1);
}
