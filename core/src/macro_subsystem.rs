//! Macro-driver subsystem: population, GDP, urbanization and yields.
//!
//! Runs first every tick. Depends on nothing but the scenario rates.
//! Urbanization grows additively; every other driver compounds.

use crate::{
    config::Scenarios,
    error::SimResult,
    event::SimEvent,
    state::SimState,
    subsystem::{SimSubsystem, YearMetrics},
    types::Year,
};

pub struct MacroSubsystem {
    scenarios: Scenarios,
}

impl MacroSubsystem {
    pub fn new(scenarios: Scenarios) -> Self {
        Self { scenarios }
    }

    /// Advance every macro driver by one year of growth.
    pub fn advance(&self, state: &mut SimState) {
        let s = &self.scenarios;
        state.population *= 1.0 + s.growth_pop;
        state.gdp *= 1.0 + s.growth_gdp;
        state.urbanization_rate += s.growth_urbanization;

        let yield_factor = 1.0 + s.growth_agri_yield;
        state.yield_grains  *= yield_factor;
        state.yield_veggies *= yield_factor;
        state.yield_fruits  *= yield_factor;
        state.yield_meat    *= yield_factor;
        state.yield_poultry *= yield_factor;
        state.yield_dairy   *= yield_factor;
    }
}

impl SimSubsystem for MacroSubsystem {
    fn name(&self) -> &'static str { "macro" }

    fn update(
        &mut self,
        year: Year,
        state: &mut SimState,
        _metrics: &mut YearMetrics,
    ) -> SimResult<Vec<SimEvent>> {
        self.advance(state);

        log::debug!(
            "year={year} macro: pop={:.0} gdp={:.1} urban={:.4}",
            state.population,
            state.gdp,
            state.urbanization_rate
        );

        Ok(vec![SimEvent::MacroDriversUpdated {
            year,
            population:        state.population,
            gdp:               state.gdp,
            urbanization_rate: state.urbanization_rate,
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;

    #[test]
    fn urbanization_is_additive_and_gdp_compounds() {
        let mut config = SimConfig::default_test().unwrap();
        config.scenarios.growth_gdp = 0.10;
        config.scenarios.growth_urbanization = 0.01;
        let mut state = SimState::from_initial(&config.initial);
        let macro_sub = MacroSubsystem::new(config.scenarios.clone());

        macro_sub.advance(&mut state);
        macro_sub.advance(&mut state);

        let expected_gdp = config.initial.gdp * 1.1 * 1.1;
        assert!((state.gdp - expected_gdp).abs() < 1e-6);
        let expected_urban = config.initial.urbanization_rate + 0.02;
        assert!((state.urbanization_rate - expected_urban).abs() < 1e-12);
    }

    #[test]
    fn yield_growth_applies_to_every_category() {
        let mut config = SimConfig::default_test().unwrap();
        config.scenarios.growth_agri_yield = 0.05;
        let mut state = SimState::from_initial(&config.initial);
        MacroSubsystem::new(config.scenarios.clone()).advance(&mut state);

        let i = &config.initial;
        for (after, before) in [
            (state.yield_grains, i.yield_grains),
            (state.yield_veggies, i.yield_veggies),
            (state.yield_fruits, i.yield_fruits),
            (state.yield_meat, i.yield_meat),
            (state.yield_poultry, i.yield_poultry),
            (state.yield_dairy, i.yield_dairy),
        ] {
            assert!((after - before * 1.05).abs() < 1e-12);
        }
    }
}
