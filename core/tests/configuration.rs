//! Configuration normalization: required keys, documented defaults
//! and scenario presets.

use wefe_core::{
    config::{ConfigSection, RawConfig, ScenarioPreset, SimConfig, SCENARIO_PRESETS},
    engine::SimEngine,
    error::SimError,
};

fn expect_missing(raw: &RawConfig, section: &str, key: &str) {
    match SimConfig::from_raw(raw) {
        Err(SimError::MissingKey { section: s, key: k }) => {
            assert_eq!(s, section);
            assert_eq!(k, key);
        }
        other => panic!("expected MissingKey {section}.{key}, got {other:?}"),
    }
}

#[test]
fn missing_required_keys_name_section_and_key() {
    let mut raw = RawConfig::default_test();
    raw.initial_data.remove("population");
    expect_missing(&raw, "initial_data", "population");

    let mut raw = RawConfig::default_test();
    raw.params.remove("energy_per_m3_water");
    expect_missing(&raw, "params", "energy_per_m3_water");

    let mut raw = RawConfig::default_test();
    raw.params.remove("emission_factor_coal");
    expect_missing(&raw, "params", "emission_factor_coal");
}

#[test]
fn missing_key_fails_before_any_tick() {
    let mut raw = RawConfig::default_test();
    raw.initial_data.remove("ws_ground");
    // No config, no engine: nothing can have run.
    assert!(SimConfig::from_raw(&raw).is_err());
}

#[test]
fn optional_keys_take_documented_defaults() {
    let config = SimConfig::from_raw(&RawConfig::default_test()).unwrap();
    let p = &config.params;
    assert_eq!(p.factor_unregistered_agri, 1.5);
    assert_eq!(p.factor_unregistered_ind, 1.2);
    assert_eq!(p.factor_unregistered_dom, 1.3);
    assert_eq!(p.factor_unregistered_energy, 1.1);
    assert_eq!(p.energy_intensity_agri, 0.0);
    assert_eq!(p.growth_co2_non_energy, 0.0128);
    assert_eq!(p.growth_co2_non_energy_post, -0.0192);
}

#[test]
fn empty_scenarios_section_uses_defaults() {
    let mut raw = RawConfig::default_test();
    raw.scenarios.clear();
    let s = SimConfig::from_raw(&raw).unwrap().scenarios;
    assert_eq!(s.growth_pop, 0.0);
    assert_eq!(s.growth_energy_efficiency, 0.015);
    assert_eq!(s.growth_energy_supply, 0.0023);
    assert_eq!(s.growth_energy_supply_post, -0.0716);
    assert_eq!(s.energy_transition_year, 2013);
}

#[test]
fn fuel_values_default_when_absent() {
    let mut raw = RawConfig::default_test();
    for key in ["es_coal", "es_oil", "es_gas"] {
        raw.initial_data.remove(key);
    }
    let i = SimConfig::from_raw(&raw).unwrap().initial;
    assert_eq!(i.es_coal, 470.137);
    assert_eq!(i.es_oil, 7752.316);
    assert_eq!(i.es_gas, 2532.210);
    assert_eq!(i.es_oil_base, 7752.316);
}

#[test]
fn every_preset_runs() {
    let ids: Vec<&str> = SCENARIO_PRESETS.iter().map(|p| p.id).collect();
    assert_eq!(ids, ["base", "optimistic", "pessimistic", "sustainable"]);

    for preset in SCENARIO_PRESETS {
        let mut raw = RawConfig::default_test();
        raw.apply_preset(preset);
        let config = SimConfig::from_raw(&raw).unwrap();
        let mut engine = SimEngine::build(format!("preset-{}", preset.id), &config);
        let table = engine.run(10).unwrap();
        assert_eq!(table.len(), 10, "preset {} did not complete", preset.id);
    }
}

#[test]
fn preset_changes_population_path() {
    let base = SimConfig::default_test().unwrap();
    let mut raw = RawConfig::default_test();
    raw.apply_preset(ScenarioPreset::find("pessimistic").unwrap());
    let pessimistic = SimConfig::from_raw(&raw).unwrap();

    assert_eq!(pessimistic.scenarios.growth_pop, 0.018);
    assert_eq!(pessimistic.params, base.params);
    assert_eq!(pessimistic.initial, base.initial);
}

#[test]
fn override_touches_one_key() {
    let raw = RawConfig::default_test()
        .with_override(ConfigSection::Params, "emission_factor_oil", 1.0);
    let config = SimConfig::from_raw(&raw).unwrap();
    assert_eq!(config.params.emission_factor_oil, 1.0);
    assert_eq!(config.params.emission_factor_coal, 94_600.0);
}

#[test]
fn shipped_config_loads() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../data/base_config.json");
    let config = SimConfig::load(path).expect("data/base_config.json loads");
    assert_eq!(config.initial.year, 2005);
    assert_eq!(config, SimConfig::default_test().unwrap());
}

fn expect_non_integer(raw: &RawConfig, section: &str, key: &str) {
    match SimConfig::from_raw(raw) {
        Err(SimError::NonIntegerKey { section: s, key: k }) => {
            assert_eq!(s, section);
            assert_eq!(k, key);
        }
        other => panic!("expected NonIntegerKey {section}.{key}, got {other:?}"),
    }
}

#[test]
fn fractional_base_year_is_rejected() {
    let raw = RawConfig::default_test().with_override(ConfigSection::InitialData, "year", 2005.6);
    expect_non_integer(&raw, "initial_data", "year");
}

#[test]
fn base_year_without_room_for_a_run_is_rejected() {
    let raw = RawConfig::default_test().with_override(ConfigSection::InitialData, "year", 1e12);
    expect_non_integer(&raw, "initial_data", "year");

    let near_max = f64::from(i32::MAX) - 10.0;
    let raw = RawConfig::default_test().with_override(ConfigSection::InitialData, "year", near_max);
    expect_non_integer(&raw, "initial_data", "year");
}

#[test]
fn fractional_transition_year_is_rejected() {
    let raw = RawConfig::default_test()
        .with_override(ConfigSection::Scenarios, "energy_transition_year", 2013.5);
    expect_non_integer(&raw, "scenarios", "energy_transition_year");
}

#[test]
fn whole_float_years_are_accepted() {
    let raw = RawConfig::default_test()
        .with_override(ConfigSection::InitialData, "year", 2010.0)
        .with_override(ConfigSection::Scenarios, "energy_transition_year", 2015.0);
    let config = SimConfig::from_raw(&raw).unwrap();
    assert_eq!(config.initial.year, 2010);
    assert_eq!(config.scenarios.energy_transition_year, 2015);
}
