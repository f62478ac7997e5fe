//! Energy subsystem: sector demand, piecewise supply growth and
//! fossil allocation.
//!
//! Execution: every tick, after Water.
//! Depends on: water demand (energy for pumping/treatment),
//!             food supply and grain production (agri energy, straw).
//! Feeds: Ecology (demand, renewables, fossil mix).
//!
//! Supply growth switches regime after the transition year. Fossil
//! supply is split with the base-year mix held in DerivedConstants.

use crate::{
    config::{Params, Scenarios},
    error::SimResult,
    event::SimEvent,
    state::{clamp_stock, DerivedConstants, SimState},
    subsystem::{safe_ratio, SimSubsystem, YearMetrics},
    types::Year,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyMetrics {
    pub energy_demand: f64,
    pub energy_supply: f64,
    pub energy_ratio: f64,
    pub demand_industry: f64,
    pub demand_domestic: f64,
    pub demand_water: f64,
    pub demand_agri: f64,
    pub supply_growth_rate: f64,
    pub supply_renewables: f64,
    pub bioenergy: f64,
    pub supply_fossil: f64,
    pub consumption_coal: f64,
    pub consumption_oil: f64,
    pub consumption_gas: f64,
    pub ratio_coal: f64,
    pub ratio_oil: f64,
    pub ratio_gas: f64,
}

pub struct EnergySubsystem {
    params:    Params,
    scenarios: Scenarios,
    constants: DerivedConstants,
    /// Regime of the previous tick: true while before the transition.
    last_regime_pre: Option<bool>,
}

impl EnergySubsystem {
    pub fn new(params: Params, scenarios: Scenarios, constants: DerivedConstants) -> Self {
        Self {
            params,
            scenarios,
            constants,
            last_regime_pre: None,
        }
    }

    /// Decay the current intensities by one year of efficiency gains,
    /// seeding them from params on first use.
    fn decay_intensities(&self, state: &mut SimState) -> (f64, f64) {
        let keep = 1.0 - self.scenarios.growth_energy_efficiency;
        let ind = state
            .intensity_energy_ind_current
            .unwrap_or(self.params.intensity_energy_ind) * keep;
        let dom = state
            .intensity_energy_dom_current
            .unwrap_or(self.params.intensity_energy_dom) * keep;
        state.intensity_energy_ind_current = Some(ind);
        state.intensity_energy_dom_current = Some(dom);
        (ind, dom)
    }

    /// Advance the state by one year and derive the energy balance.
    pub fn compute(
        &self,
        year: Year,
        state: &mut SimState,
        water_demand: f64,
        food_supply_total: f64,
        production_grains: f64,
    ) -> EnergyMetrics {
        let p = &self.params;

        // ── Demand ─────────────────────────────────────────────
        let (ind_intensity, dom_intensity) = self.decay_intensities(state);
        let demand_industry = state.gdp * ind_intensity;
        let demand_domestic = state.population * dom_intensity;
        let demand_water = water_demand * p.energy_per_m3_water;
        let demand_agri = food_supply_total * p.energy_intensity_agri;
        let demand = demand_industry + demand_domestic + demand_water + demand_agri;

        // ── Supply ─────────────────────────────────────────────
        let growth = self.scenarios.energy_supply_growth(year);
        state.energy_production_total = clamp_stock(state.energy_production_total * (1.0 + growth));
        let supply = state.energy_production_total;

        let bioenergy = production_grains * p.straw_energy_factor;
        let renewables = state.es_renewables + bioenergy;

        let fossil = (supply - renewables).max(0.0);
        let mix = self.constants.fossil_mix;
        let (coal, oil, gas) = mix.split(fossil);
        state.es_coal = coal;
        state.es_oil = oil;
        state.es_gas = gas;

        EnergyMetrics {
            energy_demand: demand,
            energy_supply: supply,
            energy_ratio: safe_ratio(supply, demand),
            demand_industry,
            demand_domestic,
            demand_water,
            demand_agri,
            supply_growth_rate: growth,
            supply_renewables: renewables,
            bioenergy,
            supply_fossil: fossil,
            consumption_coal: coal,
            consumption_oil: oil,
            consumption_gas: gas,
            ratio_coal: mix.coal,
            ratio_oil: mix.oil,
            ratio_gas: mix.gas,
        }
    }
}

impl SimSubsystem for EnergySubsystem {
    fn name(&self) -> &'static str { "energy" }

    fn update(
        &mut self,
        year: Year,
        state: &mut SimState,
        metrics: &mut YearMetrics,
    ) -> SimResult<Vec<SimEvent>> {
        let water_demand = metrics.water(self.name())?.water_demand;
        let food = metrics.food(self.name())?;
        let (food_supply, grains) = (food.food_supply_total, food.production_grains);

        let energy = self.compute(year, state, water_demand, food_supply, grains);

        log::debug!(
            "year={year} energy: demand={:.1} supply={:.1} ratio={:.3} growth={:+.4}",
            energy.energy_demand,
            energy.energy_supply,
            energy.energy_ratio,
            energy.supply_growth_rate
        );

        let mut events = Vec::new();
        let pre = self.scenarios.before_transition(year);
        if self.last_regime_pre == Some(true) && !pre {
            events.push(SimEvent::EnergyRegimeSwitched {
                year,
                growth_rate: energy.supply_growth_rate,
            });
        }
        self.last_regime_pre = Some(pre);

        if energy.supply_renewables > energy.energy_supply {
            events.push(SimEvent::RenewablesExceedSupply {
                year,
                supply_renewables: energy.supply_renewables,
                energy_supply:     energy.energy_supply,
            });
        }

        metrics.energy = Some(energy);
        Ok(events)
    }
}
