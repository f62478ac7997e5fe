//! Parameter sweep: grid search over discrete candidates.

use wefe_core::{
    calibration::{ReferenceTable, VariableMapping},
    config::{ConfigSection, RawConfig, SimConfig},
    engine::simulate,
    sweep::{grid_search, SweepAxis},
};

fn co2_reference(years: i64) -> ReferenceTable {
    let config = SimConfig::default_test().unwrap();
    let table = simulate("reference".into(), &config, years).unwrap();
    ReferenceTable::from_result_table(&table, &[("total_co2", "co2_emissions")]).unwrap()
}

#[test]
fn sweep_recovers_the_generating_value() {
    let reference = co2_reference(12);
    let axes = vec![SweepAxis::new(
        ConfigSection::Params,
        "emission_factor_oil",
        &[60_000.0, 70_000.0, 74_000.0, 80_000.0],
    )];
    let target = VariableMapping::column("total_co2", "co2_emissions");

    let outcome = grid_search(&RawConfig::default_test(), &axes, &reference, &target).unwrap();

    assert_eq!(outcome.evaluated, 4);
    assert_eq!(outcome.best_assignment, vec![("emission_factor_oil".to_string(), 74_000.0)]);
    assert_eq!(outcome.best_error, 0.0);
}

#[test]
fn sweep_enumerates_every_combination() {
    let reference = co2_reference(5);
    let axes = vec![
        SweepAxis::new(ConfigSection::Params, "emission_factor_coal", &[90_000.0, 94_600.0]),
        SweepAxis::new(ConfigSection::Params, "emission_factor_gas", &[50_000.0, 56_100.0, 60_000.0]),
    ];
    let target = VariableMapping::column("total_co2", "co2_emissions");

    let outcome = grid_search(&RawConfig::default_test(), &axes, &reference, &target).unwrap();

    assert_eq!(outcome.evaluated, 6);
    assert_eq!(
        outcome.best_assignment,
        vec![
            ("emission_factor_coal".to_string(), 94_600.0),
            ("emission_factor_gas".to_string(), 56_100.0),
        ]
    );
    let best = SimConfig::from_raw(&outcome.best_config).unwrap();
    assert_eq!(best.params.emission_factor_gas, 56_100.0);
}

#[test]
fn ties_keep_the_first_candidate() {
    let reference = co2_reference(4);
    // Wastewater concentration does not touch CO2, so every candidate ties.
    let axes = vec![SweepAxis::new(
        ConfigSection::Params,
        "pollutant_concentration_dom",
        &[0.0001, 0.0003, 0.0005],
    )];
    let target = VariableMapping::column("total_co2", "co2_emissions");

    let outcome = grid_search(&RawConfig::default_test(), &axes, &reference, &target).unwrap();
    assert_eq!(outcome.best_assignment[0].1, 0.0001);
    assert_eq!(outcome.evaluated, 3);
}

#[test]
fn empty_axis_is_rejected() {
    let reference = co2_reference(2);
    let axes = vec![SweepAxis::new(ConfigSection::Params, "emission_factor_oil", &[])];
    let target = VariableMapping::column("total_co2", "co2_emissions");
    assert!(grid_search(&RawConfig::default_test(), &axes, &reference, &target).is_err());
}
