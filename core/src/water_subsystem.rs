//! Water subsystem: sector demand corrected for unregistered use,
//! against the usable share of natural supply.
//!
//! Execution: every tick, after Food.
//! Depends on: food output being present (pipeline order).
//! Feeds: Energy (water demand), Engine (groundwater feedback).
//!
//! The ratio denominator excludes the ecological requirement: the
//! effective-supply factor already reserves water for ecological flow.

use crate::{
    config::Params,
    error::SimResult,
    event::SimEvent,
    state::SimState,
    subsystem::{safe_ratio, SimSubsystem, YearMetrics},
    types::Year,
};
use serde::{Deserialize, Serialize};

/// Usable fraction of natural supply after ecological and conveyance losses.
pub const EFFECTIVE_SUPPLY_FACTOR: f64 = 0.429;
/// Raw sector demand is in m³; reported demand is in millions of m³.
pub const DEMAND_REPORTING_SCALE: f64 = 1_000_000.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterMetrics {
    /// Consumptive human demand, reporting units.
    pub water_demand: f64,
    /// Effective usable supply.
    pub water_supply: f64,
    pub water_ratio: f64,
    pub wd_eco: f64,
    pub wd_total_system: f64,
    /// Natural supply before the effective-supply factor.
    pub ws_potential: f64,
}

pub struct WaterSubsystem {
    params: Params,
}

impl WaterSubsystem {
    pub fn new(params: Params) -> Self {
        Self { params }
    }

    pub fn compute(&self, state: &SimState) -> WaterMetrics {
        let p = &self.params;

        let agri = state.crop_area_total() * p.quota_water_crop * p.factor_unregistered_agri;
        let ind = state.gdp * p.quota_water_ind * p.factor_unregistered_ind;
        let dom = state.population * p.quota_water_dom * p.factor_unregistered_dom;
        let energy = state.energy_production_total
            * p.quota_water_energy
            * p.factor_unregistered_energy;

        let human = (agri + ind + dom + energy) / DEMAND_REPORTING_SCALE;
        let eco = state.wd_eco_req;

        let potential = state.ws_natural_total();
        let effective = potential * EFFECTIVE_SUPPLY_FACTOR;

        WaterMetrics {
            water_demand: human,
            water_supply: effective,
            water_ratio: safe_ratio(effective, human),
            wd_eco: eco,
            wd_total_system: human + eco,
            ws_potential: potential,
        }
    }
}

impl SimSubsystem for WaterSubsystem {
    fn name(&self) -> &'static str { "water" }

    fn update(
        &mut self,
        year: Year,
        state: &mut SimState,
        metrics: &mut YearMetrics,
    ) -> SimResult<Vec<SimEvent>> {
        metrics.food(self.name())?;

        let water = self.compute(state);

        log::debug!(
            "year={year} water: demand={:.1} supply={:.1} ratio={:.3}",
            water.water_demand,
            water.water_supply,
            water.water_ratio
        );

        metrics.water = Some(water);
        Ok(vec![])
    }
}
