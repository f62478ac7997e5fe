//! wefe-runner: headless runner for the WEFE simulator.
//!
//! Usage:
//!   wefe-runner --config data/base_config.json --years 30
//!   wefe-runner --scenario sustainable --years 50 --db runs.db
//!   wefe-runner --reference data/reference/energy_supply.json
//!   wefe-runner --years 20 --out results.ndjson

use anyhow::{bail, Context, Result};
use std::env;
use std::fs::File;
use std::io::{BufWriter, Write};
use uuid::Uuid;
use wefe_core::{
    calibration::{self, ReferenceTable},
    config::{RawConfig, ScenarioPreset, SimConfig},
    engine::{validate_years, SimEngine},
    snapshot::{ResultTable, RunSummary},
    store::SimStore,
};

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let years = parse_years(&args)?.unwrap_or(30);
    let config_path = flag_value(&args, "--config").unwrap_or("data/base_config.json");
    let scenario = flag_value(&args, "--scenario");
    let db = flag_value(&args, "--db");
    let reference_path = flag_value(&args, "--reference");
    let out = flag_value(&args, "--out");

    let mut raw = RawConfig::load(config_path)?;
    if let Some(id) = scenario {
        let preset = ScenarioPreset::find(id)
            .with_context(|| format!("Unknown scenario preset '{id}'"))?;
        log::info!("applying preset {}: {}", preset.id, preset.description);
        raw.apply_preset(preset);
    }
    let config = SimConfig::from_raw(&raw)
        .with_context(|| format!("Invalid configuration in {config_path}"))?;

    let reference = reference_path.map(ReferenceTable::load).transpose()?;
    // A reference table fixes the horizon to its own length.
    let years = match &reference {
        Some(r) => r.len() as i64,
        None => years,
    };
    let years = validate_years(years)?;

    let run_id = Uuid::new_v4().to_string();
    println!("wefe-runner: WEFE simulator");
    println!("  run_id:    {run_id}");
    println!("  config:    {config_path}");
    println!("  scenario:  {}", scenario.unwrap_or("(from config)"));
    println!("  base year: {}", config.initial.year);
    println!("  years:     {years}");
    println!();

    let mut engine = SimEngine::build(run_id.clone(), &config);
    let table = engine.run(years)?;

    print_table(&table);
    if let Some(summary) = table.summary() {
        print_summary(&summary);
    }

    if let Some(reference) = &reference {
        let mapping = calibration::covered_mapping(reference);
        if mapping.is_empty() {
            log::warn!("reference table has none of the calibrated columns");
        }
        let report = calibration::score(&table, reference, &mapping)?;
        println!();
        println!("=== CALIBRATION ===");
        print!("{report}");
        for score in &report.scores {
            println!();
            print!("{}", score.residual_table());
        }
    }

    if let Some(path) = out {
        write_ndjson(path, &table)?;
        println!();
        println!("  wrote {} rows to {path}", table.len());
    }

    if let Some(path) = db {
        let mut store = SimStore::open(path)
            .with_context(|| format!("Cannot open database {path}"))?;
        store.migrate()?;
        store.insert_run(&run_id, config.initial.year, years, scenario)?;
        store.save_result_table(&run_id, &table)?;
        store.append_events(engine.event_log())?;
        if let (Some(name), Some(reference)) = (reference_path, &reference) {
            store.insert_reference_table(name, reference)?;
        }
        println!("  persisted run {run_id} to {path}");
    }

    Ok(())
}

fn print_table(table: &ResultTable) {
    println!(
        "{:>6} {:>14} {:>14} {:>10} {:>10} {:>12}",
        "year", "water supply", "water demand", "food", "energy", "CO2 (Mt)"
    );
    for row in table.iter() {
        println!(
            "{:>6} {:>14.1} {:>14.1} {:>10.3} {:>10.3} {:>12.2}",
            row.year(),
            row.water.water_supply,
            row.water.water_demand,
            row.food.food_ratio,
            row.energy.energy_ratio,
            row.ecology.total_co2,
        );
    }
}

fn print_summary(s: &RunSummary) {
    println!();
    println!("=== RUN SUMMARY ===");
    println!("  years:               {} ({}-{})", s.total_years, s.start_year, s.end_year);
    println!("  final water ratio:   {:.3}", s.final_water_ratio);
    println!("  final food ratio:    {:.3}", s.final_food_ratio);
    println!("  final energy ratio:  {:.3}", s.final_energy_ratio);
    println!("  final energy demand: {:.1}", s.final_energy_demand);
    println!("  final energy supply: {:.1}", s.final_energy_supply);
    println!("  cumulative CO2:      {:.1} Mt", s.total_co2_emissions);
    println!("  mean water ratio:    {:.3}", s.avg_water_ratio);
}

/// One JSON object per simulated year.
fn write_ndjson(path: &str, table: &ResultTable) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Cannot create {path}"))?;
    let mut writer = BufWriter::new(file);
    for row in table.iter() {
        writeln!(writer, "{}", serde_json::to_string(row)?)?;
    }
    writer.flush()?;
    Ok(())
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

/// `None` when `--years` is absent. Range checks happen in `validate_years`.
fn parse_years(args: &[String]) -> Result<Option<i64>> {
    let Some(value) = flag_value(args, "--years") else {
        return Ok(None);
    };
    match value.parse::<i64>() {
        Ok(years) => Ok(Some(years)),
        Err(_) => bail!("--years must be a whole number, got '{value}'"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("wefe-runner")
            .chain(list.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn years_flag_parses_whole_numbers() {
        assert_eq!(parse_years(&args(&["--years", "12"])).unwrap(), Some(12));
        assert_eq!(parse_years(&args(&["--years", "-3"])).unwrap(), Some(-3));
    }

    #[test]
    fn absent_years_flag_is_none() {
        assert_eq!(parse_years(&args(&["--scenario", "baseline"])).unwrap(), None);
    }

    #[test]
    fn unparseable_years_are_rejected_with_the_value() {
        for bad in ["abc", "2.5", ""] {
            let err = parse_years(&args(&["--years", bad])).unwrap_err();
            assert!(
                err.to_string().contains(&format!("'{bad}'")),
                "error should name '{bad}': {err}"
            );
        }
    }
}
