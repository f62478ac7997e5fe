//! Historical calibration: MAPE of simulated columns against a
//! reference table.
//!
//! A reference table has one row per year, in the same order as the
//! run. Each mapped variable compares one simulated column with either a
//! single reference column or the row-wise sum of several.
//!
//! Reference values of exactly zero are scored as if they were 1.

use crate::{
    config::SimConfig,
    engine,
    error::{SimError, SimResult},
    snapshot::ResultTable,
    types::{RunId, Year},
};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};

/// A variable passes calibration at or below this mean error.
pub const PASS_THRESHOLD_PCT: f64 = 5.0;

pub type ReferenceRow = BTreeMap<String, f64>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferenceTable {
    pub rows: Vec<ReferenceRow>,
}

impl ReferenceTable {
    pub fn new(rows: Vec<ReferenceRow>) -> Self {
        Self { rows }
    }

    /// Load a JSON array of `{ column: value }` objects.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let table: ReferenceTable = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        Ok(table)
    }

    /// Copy columns of a simulated table under new names.
    /// Pairs are `(simulated column, reference column)`.
    pub fn from_result_table(table: &ResultTable, columns: &[(&str, &str)]) -> SimResult<Self> {
        let mut rows: Vec<ReferenceRow> = vec![ReferenceRow::new(); table.len()];
        for (sim_column, ref_column) in columns {
            for (row, value) in rows.iter_mut().zip(table.column(sim_column)?) {
                row.insert(ref_column.to_string(), value);
            }
        }
        Ok(Self { rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// True if every row carries `column`.
    pub fn has_column(&self, column: &str) -> bool {
        !self.rows.is_empty() && self.rows.iter().all(|r| r.contains_key(column))
    }

    pub fn value(&self, row: usize, column: &str) -> SimResult<f64> {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .copied()
            .ok_or_else(|| SimError::MissingReferenceColumn {
                column: column.to_string(),
                row,
            })
    }
}

/// Where the observed value for a simulated variable comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReferenceSource {
    Column(String),
    Sum(Vec<String>),
}

impl ReferenceSource {
    fn available_in(&self, reference: &ReferenceTable) -> bool {
        match self {
            ReferenceSource::Column(column) => reference.has_column(column),
            ReferenceSource::Sum(columns) => columns.iter().all(|c| reference.has_column(c)),
        }
    }

    fn observed(&self, reference: &ReferenceTable, row: usize) -> SimResult<f64> {
        match self {
            ReferenceSource::Column(column) => reference.value(row, column),
            ReferenceSource::Sum(columns) => columns
                .iter()
                .map(|c| reference.value(row, c))
                .sum(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableMapping {
    pub variable: String,
    pub source: ReferenceSource,
}

impl VariableMapping {
    pub fn column(variable: &str, column: &str) -> Self {
        Self {
            variable: variable.to_string(),
            source: ReferenceSource::Column(column.to_string()),
        }
    }

    pub fn sum(variable: &str, columns: &[&str]) -> Self {
        Self {
            variable: variable.to_string(),
            source: ReferenceSource::Sum(columns.iter().map(|c| c.to_string()).collect()),
        }
    }
}

/// Simulated variables scored against the historical validation series.
pub fn default_mapping() -> Vec<VariableMapping> {
    vec![
        VariableMapping::column("water_demand", "water_demand_total"),
        VariableMapping::column("total_co2", "co2_emissions"),
        VariableMapping::sum(
            "food_supply_total",
            &["prod_grains", "prod_vegetables", "prod_fruits", "prod_meat", "prod_dairy"],
        ),
        VariableMapping::column("energy_demand", "energy_consumption"),
        VariableMapping::column("energy_supply", "energy_supply"),
    ]
}

/// The default mapping restricted to the variables `reference` can score.
pub fn covered_mapping(reference: &ReferenceTable) -> Vec<VariableMapping> {
    default_mapping()
        .into_iter()
        .filter(|m| m.source.available_in(reference))
        .collect()
}

/// One year of one scored variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Residual {
    pub year: Year,
    pub observed: f64,
    pub simulated: f64,
    /// Simulated minus observed.
    pub diff: f64,
    /// Absolute percentage error of this year.
    pub pct: f64,
}

impl Residual {
    pub fn new(year: Year, simulated: f64, observed: f64) -> Self {
        Self {
            year,
            observed,
            simulated,
            diff: simulated - observed,
            pct: pct_error(simulated, observed),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationScore {
    pub variable: String,
    /// Mean absolute percentage error, in percent.
    pub mape: f64,
    pub passed: bool,
    /// Per-year breakdown, in table order.
    pub residuals: Vec<Residual>,
}

impl CalibrationScore {
    /// Year-by-year validation table followed by the mean error.
    pub fn residual_table(&self) -> String {
        let mut out = format!(
            "VARIABLE: {}\n{:<6} | {:>15} | {:>15} | {:>15} | {:>10}\n",
            self.variable, "Year", "Observed", "Simulated", "Difference", "Error (%)"
        );
        for r in &self.residuals {
            out.push_str(&format!(
                "{:<6} | {:>15.2} | {:>15.2} | {:>15.2} | {:>9.2}%\n",
                r.year, r.observed, r.simulated, r.diff, r.pct
            ));
        }
        out.push_str(&format!("Mean error (MAPE): {:.2}%\n", self.mape));
        out
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalibrationReport {
    /// In mapping order.
    pub scores: Vec<CalibrationScore>,
}

impl CalibrationReport {
    pub fn get(&self, variable: &str) -> Option<&CalibrationScore> {
        self.scores.iter().find(|s| s.variable == variable)
    }

    pub fn all_passed(&self) -> bool {
        self.scores.iter().all(|s| s.passed)
    }

    /// Mean of the per-variable errors; 0 for an empty report.
    pub fn mean_error(&self) -> f64 {
        if self.scores.is_empty() {
            return 0.0;
        }
        self.scores.iter().map(|s| s.mape).sum::<f64>() / self.scores.len() as f64
    }

    pub fn as_map(&self) -> BTreeMap<String, f64> {
        self.scores.iter().map(|s| (s.variable.clone(), s.mape)).collect()
    }
}

impl fmt::Display for CalibrationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for s in &self.scores {
            let status = if s.passed { "OK" } else { "ADJUST" };
            writeln!(f, "Variable: {:<20} | Mean error: {:.2}% -> {status}", s.variable, s.mape)?;
        }
        Ok(())
    }
}

/// Mean absolute percentage error of `simulated` against `observed`.
pub fn mape(simulated: &[f64], observed: &[f64]) -> f64 {
    let pcts: Vec<f64> = simulated
        .iter()
        .zip(observed)
        .map(|(sim, real)| pct_error(*sim, *real))
        .collect();
    mean(&pcts)
}

/// A zero observation divides by one.
fn pct_error(simulated: f64, observed: f64) -> f64 {
    let denom = if observed == 0.0 { 1.0 } else { observed };
    ((simulated - observed) / denom).abs() * 100.0
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Score a finished run against a reference of the same length.
pub fn score(
    table: &ResultTable,
    reference: &ReferenceTable,
    mapping: &[VariableMapping],
) -> SimResult<CalibrationReport> {
    if reference.is_empty() {
        return Err(SimError::EmptyReference);
    }
    if table.len() != reference.len() {
        return Err(SimError::Other(anyhow::anyhow!(
            "result table has {} rows, reference has {}",
            table.len(),
            reference.len()
        )));
    }

    let variables: Vec<&str> = mapping.iter().map(|m| m.variable.as_str()).collect();
    let columns = table.columns(&variables)?;

    let mut scores = Vec::with_capacity(mapping.len());
    for (m, simulated) in mapping.iter().zip(columns) {
        let residuals = table
            .iter()
            .zip(simulated)
            .enumerate()
            .map(|(row, (snapshot, sim))| {
                let observed = m.source.observed(reference, row)?;
                Ok(Residual::new(snapshot.year(), sim, observed))
            })
            .collect::<SimResult<Vec<Residual>>>()?;
        let pcts: Vec<f64> = residuals.iter().map(|r| r.pct).collect();
        let error = mean(&pcts);
        log::debug!("calibration: {} mape={error:.2}%", m.variable);
        scores.push(CalibrationScore {
            variable: m.variable.clone(),
            mape: error,
            passed: error <= PASS_THRESHOLD_PCT,
            residuals,
        });
    }
    Ok(CalibrationReport { scores })
}

/// Run a fresh engine for as many years as the reference has rows and
/// score it.
pub fn calibrate(
    run_id: RunId,
    config: &SimConfig,
    reference: &ReferenceTable,
    mapping: &[VariableMapping],
) -> SimResult<CalibrationReport> {
    if reference.is_empty() {
        return Err(SimError::EmptyReference);
    }
    let table = engine::simulate(run_id, config, reference.len() as i64)?;
    score(&table, reference, mapping)
}
