//! Year snapshots and the result table a run returns.
//!
//! A snapshot is taken once per tick, after Ecology and before the
//! groundwater feedback. It is immutable once produced. Serialized, a
//! snapshot is one flat row: state fields followed by every metric.

use crate::{
    ecology_subsystem::EcologyMetrics,
    energy_subsystem::EnergyMetrics,
    error::{SimError, SimResult},
    food_subsystem::FoodMetrics,
    state::SimState,
    types::Year,
    water_subsystem::WaterMetrics,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearSnapshot {
    /// Carries the `year` label of the row.
    #[serde(flatten)]
    pub state: SimState,
    #[serde(flatten)]
    pub food: FoodMetrics,
    #[serde(flatten)]
    pub water: WaterMetrics,
    #[serde(flatten)]
    pub energy: EnergyMetrics,
    #[serde(flatten)]
    pub ecology: EcologyMetrics,
}

impl YearSnapshot {
    pub fn year(&self) -> Year {
        self.state.year
    }

    /// The row as a flat JSON object keyed by column name.
    pub fn to_row(&self) -> SimResult<serde_json::Map<String, serde_json::Value>> {
        match serde_json::to_value(self)? {
            serde_json::Value::Object(map) => Ok(map),
            other => Err(SimError::Other(anyhow::anyhow!(
                "snapshot serialized to non-object: {other}"
            ))),
        }
    }
}

/// Ordered snapshots, one per simulated year, year ascending.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultTable {
    pub rows: Vec<YearSnapshot>,
}

impl ResultTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &YearSnapshot> {
        self.rows.iter()
    }

    pub fn first(&self) -> Option<&YearSnapshot> {
        self.rows.first()
    }

    pub fn last(&self) -> Option<&YearSnapshot> {
        self.rows.last()
    }

    /// All values of one numeric column, in year order.
    pub fn column(&self, name: &str) -> SimResult<Vec<f64>> {
        let mut columns = self.columns(&[name])?;
        Ok(columns.pop().unwrap_or_default())
    }

    /// Several numeric columns at once, each in year order. Every row is
    /// serialized once regardless of how many columns are asked for.
    pub fn columns(&self, names: &[&str]) -> SimResult<Vec<Vec<f64>>> {
        let mut out: Vec<Vec<f64>> = names.iter().map(|_| Vec::with_capacity(self.len())).collect();
        for (row, snapshot) in self.rows.iter().enumerate() {
            let map = snapshot.to_row()?;
            for (name, column) in names.iter().zip(out.iter_mut()) {
                let value = map.get(*name).and_then(|v| v.as_f64()).ok_or_else(|| {
                    SimError::MissingReferenceColumn {
                        column: name.to_string(),
                        row,
                    }
                })?;
                column.push(value);
            }
        }
        Ok(out)
    }

    pub fn summary(&self) -> Option<RunSummary> {
        RunSummary::from_table(self)
    }
}

/// Headline figures for a completed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total_years: usize,
    pub start_year: Year,
    pub end_year: Year,
    pub final_water_ratio: f64,
    pub final_food_ratio: f64,
    pub final_energy_ratio: f64,
    pub final_energy_demand: f64,
    pub final_energy_supply: f64,
    pub total_co2_emissions: f64,
    pub avg_water_ratio: f64,
}

impl RunSummary {
    /// None for an empty table.
    pub fn from_table(table: &ResultTable) -> Option<Self> {
        let first = table.first()?;
        let last = table.last()?;
        let n = table.len() as f64;
        Some(Self {
            total_years: table.len(),
            start_year: first.year(),
            end_year: last.year(),
            final_water_ratio: last.water.water_ratio,
            final_food_ratio: last.food.food_ratio,
            final_energy_ratio: last.energy.energy_ratio,
            final_energy_demand: last.energy.energy_demand,
            final_energy_supply: last.energy.energy_supply,
            total_co2_emissions: table.iter().map(|r| r.ecology.total_co2).sum(),
            avg_water_ratio: table.iter().map(|r| r.water.water_ratio).sum::<f64>() / n,
        })
    }
}
