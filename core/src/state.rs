//! The State Store: the one mutable instance a run evolves year by year.
//!
//! RULE: exactly one SimState is live per run and the engine owns it.
//! Stocks never go negative; writers clamp through `clamp_stock`.

use crate::{config::InitialData, types::Year};
use serde::{Deserialize, Serialize};

/// Fallback coal/oil/gas shares when the base-year fossil total is zero.
pub const FALLBACK_FOSSIL_MIX: FossilMix = FossilMix {
    coal: 0.0437,
    oil:  0.7208,
    gas:  0.2354,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FossilMix {
    pub coal: f64,
    pub oil: f64,
    pub gas: f64,
}

impl FossilMix {
    /// Shares of each fuel in the given base-year totals.
    pub fn from_base(coal: f64, oil: f64, gas: f64) -> Self {
        let total = coal + oil + gas;
        if total > 0.0 {
            Self {
                coal: coal / total,
                oil:  oil / total,
                gas:  gas / total,
            }
        } else {
            FALLBACK_FOSSIL_MIX
        }
    }

    pub fn sum(&self) -> f64 {
        self.coal + self.oil + self.gas
    }

    /// Split `amount` across the three fuels, preserving the mix.
    pub fn split(&self, amount: f64) -> (f64, f64, f64) {
        (amount * self.coal, amount * self.oil, amount * self.gas)
    }
}

/// Read-only quantities fixed once at run start.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedConstants {
    pub fossil_mix: FossilMix,
}

impl DerivedConstants {
    pub fn from_initial(initial: &InitialData) -> Self {
        Self {
            fossil_mix: FossilMix::from_base(
                initial.es_coal_base,
                initial.es_oil_base,
                initial.es_gas_base,
            ),
        }
    }
}

/// Current-year stocks plus the evolving intensities the subsystems carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimState {
    pub year: Year,
    pub population: f64,
    pub gdp: f64,
    pub urbanization_rate: f64,
    pub area_grains: f64,
    pub area_veggies: f64,
    pub area_fruits: f64,
    pub yield_grains: f64,
    pub yield_veggies: f64,
    pub yield_fruits: f64,
    pub yield_meat: f64,
    pub yield_poultry: f64,
    pub yield_dairy: f64,
    pub heads_cows: f64,
    pub heads_poultry: f64,
    pub heads_dairy: f64,
    pub ws_surface: f64,
    pub ws_ground: f64,
    pub ws_unconventional: f64,
    pub wd_eco_req: f64,
    pub energy_production_total: f64,
    pub es_renewables: f64,
    pub es_coal: f64,
    pub es_oil: f64,
    pub es_gas: f64,
    /// Industrial energy intensity after efficiency decay. None until the
    /// energy subsystem first runs.
    pub intensity_energy_ind_current: Option<f64>,
    pub intensity_energy_dom_current: Option<f64>,
    /// Non-energy CO2 stock. None until the ecology subsystem first runs.
    pub co2_non_energy_current: Option<f64>,
}

impl SimState {
    pub fn from_initial(initial: &InitialData) -> Self {
        Self {
            year:                    initial.year,
            population:              initial.population,
            gdp:                     initial.gdp,
            urbanization_rate:       initial.urbanization_rate,
            area_grains:             clamp_stock(initial.area_grains),
            area_veggies:            clamp_stock(initial.area_veggies),
            area_fruits:             clamp_stock(initial.area_fruits),
            yield_grains:            initial.yield_grains,
            yield_veggies:           initial.yield_veggies,
            yield_fruits:            initial.yield_fruits,
            yield_meat:              initial.yield_meat,
            yield_poultry:           initial.yield_poultry,
            yield_dairy:             initial.yield_dairy,
            heads_cows:              clamp_stock(initial.heads_cows),
            heads_poultry:           clamp_stock(initial.heads_poultry),
            heads_dairy:             clamp_stock(initial.heads_dairy),
            ws_surface:              clamp_stock(initial.ws_surface),
            ws_ground:               clamp_stock(initial.ws_ground),
            ws_unconventional:       clamp_stock(initial.ws_unconventional),
            wd_eco_req:              initial.wd_eco_req,
            energy_production_total: clamp_stock(initial.energy_production_total),
            es_renewables:           initial.es_renewables,
            es_coal:                 initial.es_coal,
            es_oil:                  initial.es_oil,
            es_gas:                  initial.es_gas,
            intensity_energy_ind_current: None,
            intensity_energy_dom_current: None,
            co2_non_energy_current:       None,
        }
    }

    pub fn ws_natural_total(&self) -> f64 {
        self.ws_surface + self.ws_ground + self.ws_unconventional
    }

    pub fn crop_area_total(&self) -> f64 {
        self.area_grains + self.area_veggies + self.area_fruits
    }

    /// Draw `amount` from the groundwater stock, floored at zero.
    /// Returns the volume actually removed.
    pub fn draw_groundwater(&mut self, amount: f64) -> f64 {
        let before = self.ws_ground;
        self.ws_ground = clamp_stock(self.ws_ground - amount);
        before - self.ws_ground
    }
}

/// Stocks are floored at zero.
pub fn clamp_stock(value: f64) -> f64 {
    value.max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mix_is_normalized() {
        let mix = FossilMix::from_base(470.137, 7752.316, 2532.210);
        assert!((mix.sum() - 1.0).abs() < 1e-12);
        assert!(mix.oil > mix.gas && mix.gas > mix.coal);
    }

    #[test]
    fn zero_base_uses_fallback_mix() {
        assert_eq!(FossilMix::from_base(0.0, 0.0, 0.0), FALLBACK_FOSSIL_MIX);
    }

    #[test]
    fn groundwater_draw_never_goes_negative() {
        let initial = crate::config::SimConfig::default_test().unwrap().initial;
        let mut state = SimState::from_initial(&initial);
        state.ws_ground = 10.0;
        let removed = state.draw_groundwater(25.0);
        assert_eq!(state.ws_ground, 0.0);
        assert_eq!(removed, 10.0);
    }
}
