//! Ecology subsystem: CO2 from fossil combustion plus a non-energy
//! stock, and wastewater COD load.
//!
//! Execution: every tick, last in registration order.
//! Depends on: energy demand, renewables supply and fossil mix.
//!
//! Combustion is demand-based: any gap between domestic supply and
//! demand is treated as imported fossil energy and still emits.

use crate::{
    config::{Params, Scenarios},
    error::SimResult,
    event::SimEvent,
    state::{FossilMix, SimState},
    subsystem::{SimSubsystem, YearMetrics},
    types::Year,
};
use serde::{Deserialize, Serialize};

/// Emission factors are per unit of energy; totals are reported in Mt.
pub const CO2_REPORTING_SCALE: f64 = 1_000_000.0;
/// Share of domestic water returned as wastewater.
pub const WASTEWATER_RETURN_FRACTION: f64 = 0.8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EcologyMetrics {
    pub fossil_burned: f64,
    pub co2_coal: f64,
    pub co2_oil: f64,
    pub co2_gas: f64,
    pub co2_energy: f64,
    pub co2_non_energy: f64,
    pub total_co2: f64,
    pub wastewater: f64,
    pub total_cod: f64,
}

pub struct EcologySubsystem {
    params:    Params,
    scenarios: Scenarios,
}

impl EcologySubsystem {
    pub fn new(params: Params, scenarios: Scenarios) -> Self {
        Self { params, scenarios }
    }

    fn non_energy_growth(&self, year: Year) -> f64 {
        if self.scenarios.before_transition(year) {
            self.params.growth_co2_non_energy
        } else {
            self.params.growth_co2_non_energy_post
        }
    }

    pub fn compute(
        &self,
        year: Year,
        state: &mut SimState,
        energy_demand: f64,
        supply_renewables: f64,
        mix: FossilMix,
    ) -> EcologyMetrics {
        let p = &self.params;

        let fossil_burned = (energy_demand - supply_renewables).max(0.0);
        let (burn_coal, burn_oil, burn_gas) = mix.split(fossil_burned);
        let co2_coal = burn_coal * p.emission_factor_coal / CO2_REPORTING_SCALE;
        let co2_oil = burn_oil * p.emission_factor_oil / CO2_REPORTING_SCALE;
        let co2_gas = burn_gas * p.emission_factor_gas / CO2_REPORTING_SCALE;
        let co2_energy = co2_coal + co2_oil + co2_gas;

        let non_energy = state.co2_non_energy_current.unwrap_or(p.co2_non_energy)
            * (1.0 + self.non_energy_growth(year));
        state.co2_non_energy_current = Some(non_energy);

        let wastewater = state.population * p.quota_water_dom * WASTEWATER_RETURN_FRACTION;

        EcologyMetrics {
            fossil_burned,
            co2_coal,
            co2_oil,
            co2_gas,
            co2_energy,
            co2_non_energy: non_energy,
            total_co2: co2_energy + non_energy,
            wastewater,
            total_cod: wastewater * p.pollutant_concentration_dom,
        }
    }
}

impl SimSubsystem for EcologySubsystem {
    fn name(&self) -> &'static str { "ecology" }

    fn update(
        &mut self,
        year: Year,
        state: &mut SimState,
        metrics: &mut YearMetrics,
    ) -> SimResult<Vec<SimEvent>> {
        let energy = metrics.energy(self.name())?;
        let mix = FossilMix {
            coal: energy.ratio_coal,
            oil:  energy.ratio_oil,
            gas:  energy.ratio_gas,
        };
        let (demand, renewables) = (energy.energy_demand, energy.supply_renewables);

        let ecology = self.compute(year, state, demand, renewables, mix);

        log::debug!(
            "year={year} ecology: co2={:.2}Mt (energy {:.2}) cod={:.1}",
            ecology.total_co2,
            ecology.co2_energy,
            ecology.total_cod
        );

        metrics.ecology = Some(ecology);
        Ok(vec![])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;

    #[test]
    fn emissions_follow_demand_not_supply() {
        let config = SimConfig::default_test().unwrap();
        let ecology = EcologySubsystem::new(config.params.clone(), config.scenarios.clone());
        let mut state = SimState::from_initial(&config.initial);
        let mix = FossilMix { coal: 0.0, oil: 1.0, gas: 0.0 };

        let m = ecology.compute(2005, &mut state, 10_000.0, 1_000.0, mix);
        let expected = 9_000.0 * config.params.emission_factor_oil / 1_000_000.0;
        assert!((m.co2_energy - expected).abs() < 1e-9);
    }

    #[test]
    fn non_energy_stock_switches_growth_after_transition() {
        let config = SimConfig::default_test().unwrap();
        let ecology = EcologySubsystem::new(config.params.clone(), config.scenarios.clone());
        let mut state = SimState::from_initial(&config.initial);
        let mix = FossilMix { coal: 0.0, oil: 1.0, gas: 0.0 };

        let pre = ecology.compute(2013, &mut state, 0.0, 0.0, mix).co2_non_energy;
        assert!((pre - config.params.co2_non_energy * 1.0128).abs() < 1e-9);
        let post = ecology.compute(2014, &mut state, 0.0, 0.0, mix).co2_non_energy;
        assert!((post - pre * (1.0 - 0.0192)).abs() < 1e-9);
    }

    #[test]
    fn cod_uses_raw_domestic_demand() {
        let config = SimConfig::default_test().unwrap();
        let ecology = EcologySubsystem::new(config.params.clone(), config.scenarios.clone());
        let mut state = SimState::from_initial(&config.initial);
        let mix = FossilMix { coal: 0.0, oil: 1.0, gas: 0.0 };

        let m = ecology.compute(2005, &mut state, 0.0, 0.0, mix);
        let p = &config.params;
        let expected = state.population * p.quota_water_dom * 0.8 * p.pollutant_concentration_dom;
        assert!((m.total_cod - expected).abs() < 1e-9);
    }
}
