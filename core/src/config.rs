//! Run configuration: the raw three-section document and its normalized form.
//!
//! RULE: defaults are filled here, once, at run start.
//! Subsystems read typed fields and never look keys up themselves.

use crate::{
    error::{SimError, SimResult},
    types::{Year, MAX_YEARS},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One section of the raw document: key → value. Non-numeric values are
/// tolerated for keys nobody reads.
pub type Section = BTreeMap<String, Value>;

/// Documented defaults for every optional key.
pub mod defaults {
    use crate::types::Year;

    // ── initial_data ───────────────────────────────
    pub const WD_ECO_REQ: f64 = 0.0;
    pub const ES_COAL: f64 = 470.137;
    pub const ES_OIL: f64 = 7752.316;
    pub const ES_GAS: f64 = 2532.210;

    // ── params ─────────────────────────────────────
    pub const FACTOR_UNREGISTERED_AGRI: f64 = 1.50;
    pub const FACTOR_UNREGISTERED_IND: f64 = 1.20;
    pub const FACTOR_UNREGISTERED_DOM: f64 = 1.30;
    pub const FACTOR_UNREGISTERED_ENERGY: f64 = 1.10;
    pub const ENERGY_INTENSITY_AGRI: f64 = 0.0;
    pub const STRAW_ENERGY_FACTOR: f64 = 0.0;
    pub const EMISSION_FACTOR_GAS: f64 = 0.0;
    pub const CO2_NON_ENERGY: f64 = 0.0;
    pub const GROWTH_CO2_NON_ENERGY: f64 = 0.0128;
    pub const GROWTH_CO2_NON_ENERGY_POST: f64 = -0.0192;

    // ── scenarios ──────────────────────────────────
    pub const GROWTH_POP: f64 = 0.0;
    pub const GROWTH_GDP: f64 = 0.0;
    pub const GROWTH_URBANIZATION: f64 = 0.0;
    pub const GROWTH_AGRI_YIELD: f64 = 0.0;
    pub const GROWTH_ENERGY_EFFICIENCY: f64 = 0.015;
    pub const GROWTH_ENERGY_SUPPLY: f64 = 0.0023;
    pub const GROWTH_ENERGY_SUPPLY_POST: f64 = -0.0716;
    pub const ENERGY_TRANSITION_YEAR: Year = 2013;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigSection {
    InitialData,
    Params,
    Scenarios,
}

impl ConfigSection {
    pub fn name(self) -> &'static str {
        match self {
            ConfigSection::InitialData => "initial_data",
            ConfigSection::Params      => "params",
            ConfigSection::Scenarios   => "scenarios",
        }
    }
}

/// The configuration document exactly as an external loader hands it over.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawConfig {
    #[serde(default)]
    pub initial_data: Section,
    #[serde(default)]
    pub params: Section,
    #[serde(default)]
    pub scenarios: Section,
}

impl RawConfig {
    /// Load a JSON document from disk.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let raw: RawConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        Ok(raw)
    }

    pub fn section(&self, which: ConfigSection) -> &Section {
        match which {
            ConfigSection::InitialData => &self.initial_data,
            ConfigSection::Params      => &self.params,
            ConfigSection::Scenarios   => &self.scenarios,
        }
    }

    pub fn section_mut(&mut self, which: ConfigSection) -> &mut Section {
        match which {
            ConfigSection::InitialData => &mut self.initial_data,
            ConfigSection::Params      => &mut self.params,
            ConfigSection::Scenarios   => &mut self.scenarios,
        }
    }

    /// Set a single numeric key, returning the modified document.
    pub fn with_override(mut self, which: ConfigSection, key: &str, value: f64) -> Self {
        self.set(which, key, value);
        self
    }

    pub fn set(&mut self, which: ConfigSection, key: &str, value: f64) {
        self.section_mut(which).insert(key.to_string(), Value::from(value));
    }

    /// Overwrite the scenario rates a preset names. Other keys are untouched.
    pub fn apply_preset(&mut self, preset: &ScenarioPreset) {
        for (key, value) in preset.rates {
            self.set(ConfigSection::Scenarios, key, *value);
        }
    }

    /// Mexico 2005-like document with hardcoded values, for tests.
    pub fn default_test() -> Self {
        let doc = serde_json::json!({
            "initial_data": {
                "year": 2005,
                "population": 103_000_000.0,
                "gdp": 9_000_000.0,
                "urbanization_rate": 0.76,
                "area_grains": 10_000_000.0,
                "area_veggies": 600_000.0,
                "area_fruits": 1_200_000.0,
                "yield_grains": 3.0,
                "yield_veggies": 15.0,
                "yield_fruits": 10.0,
                "yield_meat": 0.06,
                "yield_poultry": 0.005,
                "yield_dairy": 4.0,
                "heads_cows": 30_000_000.0,
                "heads_poultry": 500_000_000.0,
                "heads_dairy": 2_500_000.0,
                "ws_surface": 400_000.0,
                "ws_ground": 90_000.0,
                "ws_unconventional": 5_000.0,
                "wd_eco_req": 20_000.0,
                "energy_production_total": 7093.954,
                "es_renewables": 800.0,
                "es_coal": 470.137,
                "es_oil": 7752.316,
                "es_gas": 2532.210,
                "country": "MX"
            },
            "params": {
                "diet_grains_per_capita": 0.17,
                "diet_veggies_per_capita": 0.06,
                "diet_fruits_per_capita": 0.09,
                "diet_red_meat_per_capita": 0.03,
                "diet_white_meat_per_capita": 0.03,
                "diet_dairy_per_capita": 0.11,
                "quota_water_crop": 6000.0,
                "quota_water_ind": 400.0,
                "quota_water_dom": 100.0,
                "quota_water_energy": 200_000.0,
                "intensity_energy_ind": 0.0005,
                "intensity_energy_dom": 0.00002,
                "energy_per_m3_water": 0.005,
                "emission_factor_coal": 94_600.0,
                "emission_factor_oil": 74_000.0,
                "emission_factor_gas": 56_100.0,
                "co2_non_energy": 120.0,
                "pollutant_concentration_dom": 0.0003
            },
            "scenarios": {
                "growth_pop": 0.0115,
                "growth_gdp": 0.02,
                "growth_urbanization": 0.004,
                "growth_agri_yield": 0.01,
                "growth_energy_efficiency": 0.015,
                "growth_energy_supply": 0.0023,
                "growth_energy_supply_post_2013": -0.0716,
                "energy_transition_year": 2013
            }
        });
        serde_json::from_value(doc).unwrap_or_default()
    }
}

/// Reads numeric keys out of one section, naming the section on failure.
struct SectionReader<'a> {
    section: ConfigSection,
    map: &'a Section,
}

impl<'a> SectionReader<'a> {
    fn new(raw: &'a RawConfig, section: ConfigSection) -> Self {
        Self { section, map: raw.section(section) }
    }

    fn required(&self, key: &str) -> SimResult<f64> {
        match self.map.get(key) {
            Some(value) => self.numeric(key, value),
            None => Err(SimError::MissingKey {
                section: self.section.name(),
                key: key.to_string(),
            }),
        }
    }

    fn optional(&self, key: &str, default: f64) -> SimResult<f64> {
        match self.map.get(key) {
            Some(value) => self.numeric(key, value),
            None => Ok(default),
        }
    }

    fn required_year(&self, key: &str) -> SimResult<Year> {
        let value = self.required(key)?;
        self.year(key, value)
    }

    fn optional_year(&self, key: &str, default: Year) -> SimResult<Year> {
        let value = self.optional(key, f64::from(default))?;
        self.year(key, value)
    }

    /// Whole numbers only, with room left for a full-length run.
    fn year(&self, key: &str, value: f64) -> SimResult<Year> {
        let min = f64::from(Year::MIN);
        let max = f64::from(Year::MAX) - f64::from(MAX_YEARS);
        if value.fract() != 0.0 || !(min..=max).contains(&value) {
            return Err(SimError::NonIntegerKey {
                section: self.section.name(),
                key: key.to_string(),
            });
        }
        Ok(value as Year)
    }

    fn numeric(&self, key: &str, value: &Value) -> SimResult<f64> {
        value.as_f64().ok_or_else(|| SimError::NonNumericKey {
            section: self.section.name(),
            key: key.to_string(),
        })
    }
}

/// Base-year stocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitialData {
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
    /// Base-year fossil mix; defaults to the current per-fuel values.
    pub es_coal_base: f64,
    pub es_oil_base: f64,
    pub es_gas_base: f64,
}

impl InitialData {
    fn from_raw(raw: &RawConfig) -> SimResult<Self> {
        let r = SectionReader::new(raw, ConfigSection::InitialData);
        let es_coal = r.optional("es_coal", defaults::ES_COAL)?;
        let es_oil = r.optional("es_oil", defaults::ES_OIL)?;
        let es_gas = r.optional("es_gas", defaults::ES_GAS)?;
        Ok(Self {
            year:                    r.required_year("year")?,
            population:              r.required("population")?,
            gdp:                     r.required("gdp")?,
            urbanization_rate:       r.required("urbanization_rate")?,
            area_grains:             r.required("area_grains")?,
            area_veggies:            r.required("area_veggies")?,
            area_fruits:             r.required("area_fruits")?,
            yield_grains:            r.required("yield_grains")?,
            yield_veggies:           r.required("yield_veggies")?,
            yield_fruits:            r.required("yield_fruits")?,
            yield_meat:              r.required("yield_meat")?,
            yield_poultry:           r.required("yield_poultry")?,
            yield_dairy:             r.required("yield_dairy")?,
            heads_cows:              r.required("heads_cows")?,
            heads_poultry:           r.required("heads_poultry")?,
            heads_dairy:             r.required("heads_dairy")?,
            ws_surface:              r.required("ws_surface")?,
            ws_ground:               r.required("ws_ground")?,
            ws_unconventional:       r.required("ws_unconventional")?,
            wd_eco_req:              r.optional("wd_eco_req", defaults::WD_ECO_REQ)?,
            energy_production_total: r.required("energy_production_total")?,
            es_renewables:           r.required("es_renewables")?,
            es_coal,
            es_oil,
            es_gas,
            es_coal_base:            r.optional("es_coal_base", es_coal)?,
            es_oil_base:             r.optional("es_oil_base", es_oil)?,
            es_gas_base:             r.optional("es_gas_base", es_gas)?,
        })
    }
}

/// Technical coefficients, fixed for the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Params {
    pub diet_grains_per_capita: f64,
    pub diet_veggies_per_capita: f64,
    pub diet_fruits_per_capita: f64,
    pub diet_red_meat_per_capita: f64,
    pub diet_white_meat_per_capita: f64,
    pub diet_dairy_per_capita: f64,
    pub quota_water_crop: f64,
    pub quota_water_ind: f64,
    pub quota_water_dom: f64,
    pub quota_water_energy: f64,
    pub factor_unregistered_agri: f64,
    pub factor_unregistered_ind: f64,
    pub factor_unregistered_dom: f64,
    pub factor_unregistered_energy: f64,
    pub intensity_energy_ind: f64,
    pub intensity_energy_dom: f64,
    pub energy_per_m3_water: f64,
    pub energy_intensity_agri: f64,
    pub straw_energy_factor: f64,
    pub emission_factor_coal: f64,
    pub emission_factor_oil: f64,
    pub emission_factor_gas: f64,
    pub co2_non_energy: f64,
    pub growth_co2_non_energy: f64,
    pub growth_co2_non_energy_post: f64,
    pub pollutant_concentration_dom: f64,
}

impl Params {
    fn from_raw(raw: &RawConfig) -> SimResult<Self> {
        let r = SectionReader::new(raw, ConfigSection::Params);
        Ok(Self {
            diet_grains_per_capita:      r.required("diet_grains_per_capita")?,
            diet_veggies_per_capita:     r.required("diet_veggies_per_capita")?,
            diet_fruits_per_capita:      r.required("diet_fruits_per_capita")?,
            diet_red_meat_per_capita:    r.required("diet_red_meat_per_capita")?,
            diet_white_meat_per_capita:  r.required("diet_white_meat_per_capita")?,
            diet_dairy_per_capita:       r.required("diet_dairy_per_capita")?,
            quota_water_crop:            r.required("quota_water_crop")?,
            quota_water_ind:             r.required("quota_water_ind")?,
            quota_water_dom:             r.required("quota_water_dom")?,
            quota_water_energy:          r.required("quota_water_energy")?,
            factor_unregistered_agri:    r.optional("factor_unregistered_agri", defaults::FACTOR_UNREGISTERED_AGRI)?,
            factor_unregistered_ind:     r.optional("factor_unregistered_ind", defaults::FACTOR_UNREGISTERED_IND)?,
            factor_unregistered_dom:     r.optional("factor_unregistered_dom", defaults::FACTOR_UNREGISTERED_DOM)?,
            factor_unregistered_energy:  r.optional("factor_unregistered_energy", defaults::FACTOR_UNREGISTERED_ENERGY)?,
            intensity_energy_ind:        r.required("intensity_energy_ind")?,
            intensity_energy_dom:        r.required("intensity_energy_dom")?,
            energy_per_m3_water:         r.required("energy_per_m3_water")?,
            energy_intensity_agri:       r.optional("energy_intensity_agri", defaults::ENERGY_INTENSITY_AGRI)?,
            straw_energy_factor:         r.optional("straw_energy_factor", defaults::STRAW_ENERGY_FACTOR)?,
            emission_factor_coal:        r.required("emission_factor_coal")?,
            emission_factor_oil:         r.required("emission_factor_oil")?,
            emission_factor_gas:         r.optional("emission_factor_gas", defaults::EMISSION_FACTOR_GAS)?,
            co2_non_energy:              r.optional("co2_non_energy", defaults::CO2_NON_ENERGY)?,
            growth_co2_non_energy:       r.optional("growth_co2_non_energy", defaults::GROWTH_CO2_NON_ENERGY)?,
            growth_co2_non_energy_post:  r.optional("growth_co2_non_energy_post_2013", defaults::GROWTH_CO2_NON_ENERGY_POST)?,
            pollutant_concentration_dom: r.required("pollutant_concentration_dom")?,
        })
    }
}

/// Annual rate assumptions. Fractional per year; urbanization is additive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenarios {
    pub growth_pop: f64,
    pub growth_gdp: f64,
    pub growth_urbanization: f64,
    pub growth_agri_yield: f64,
    pub growth_energy_efficiency: f64,
    pub growth_energy_supply: f64,
    pub growth_energy_supply_post: f64,
    pub energy_transition_year: Year,
}

impl Scenarios {
    fn from_raw(raw: &RawConfig) -> SimResult<Self> {
        let r = SectionReader::new(raw, ConfigSection::Scenarios);
        Ok(Self {
            growth_pop:                r.optional("growth_pop", defaults::GROWTH_POP)?,
            growth_gdp:                r.optional("growth_gdp", defaults::GROWTH_GDP)?,
            growth_urbanization:       r.optional("growth_urbanization", defaults::GROWTH_URBANIZATION)?,
            growth_agri_yield:         r.optional("growth_agri_yield", defaults::GROWTH_AGRI_YIELD)?,
            growth_energy_efficiency:  r.optional("growth_energy_efficiency", defaults::GROWTH_ENERGY_EFFICIENCY)?,
            growth_energy_supply:      r.optional("growth_energy_supply", defaults::GROWTH_ENERGY_SUPPLY)?,
            growth_energy_supply_post: r.optional("growth_energy_supply_post_2013", defaults::GROWTH_ENERGY_SUPPLY_POST)?,
            energy_transition_year:    r.optional_year(
                "energy_transition_year",
                defaults::ENERGY_TRANSITION_YEAR,
            )?,
        })
    }

    /// True while `year` is still inside the pre-transition regime.
    pub fn before_transition(&self, year: Year) -> bool {
        year <= self.energy_transition_year
    }

    /// Energy supply growth rate in force for `year`.
    pub fn energy_supply_growth(&self, year: Year) -> f64 {
        if self.before_transition(year) {
            self.growth_energy_supply
        } else {
            self.growth_energy_supply_post
        }
    }
}

/// The normalized configuration every subsystem reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    pub initial: InitialData,
    pub params: Params,
    pub scenarios: Scenarios,
}

impl SimConfig {
    /// Normalize a raw document. Fails on the first missing required key.
    pub fn from_raw(raw: &RawConfig) -> SimResult<Self> {
        Ok(Self {
            initial:   InitialData::from_raw(raw)?,
            params:    Params::from_raw(raw)?,
            scenarios: Scenarios::from_raw(raw)?,
        })
    }

    /// Load and normalize a JSON configuration file.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let raw = RawConfig::load(path)?;
        Ok(Self::from_raw(&raw)?)
    }

    /// Normalized form of `RawConfig::default_test()`.
    pub fn default_test() -> SimResult<Self> {
        Self::from_raw(&RawConfig::default_test())
    }
}

/// A named bundle of scenario rates a caller can pick instead of
/// hand-specifying them.
#[derive(Debug, Clone, Copy)]
pub struct ScenarioPreset {
    pub id: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    pub rates: &'static [(&'static str, f64)],
}

pub const SCENARIO_PRESETS: &[ScenarioPreset] = &[
    ScenarioPreset {
        id: "base",
        label: "Base case (business as usual)",
        description: "Historical growth rates continued at a moderate pace",
        rates: &[
            ("growth_pop", 0.0115),
            ("growth_gdp", 0.01),
            ("growth_urbanization", 0.0176),
            ("growth_agri_yield", 0.022),
        ],
    },
    ScenarioPreset {
        id: "optimistic",
        label: "Optimistic",
        description: "High economic growth with technology improvements",
        rates: &[
            ("growth_pop", 0.010),
            ("growth_gdp", 0.035),
            ("growth_urbanization", 0.006),
            ("growth_agri_yield", 0.030),
        ],
    },
    ScenarioPreset {
        id: "pessimistic",
        label: "Pessimistic",
        description: "Low growth under resource stress",
        rates: &[
            ("growth_pop", 0.018),
            ("growth_gdp", 0.015),
            ("growth_urbanization", 0.003),
            ("growth_agri_yield", 0.010),
        ],
    },
    ScenarioPreset {
        id: "sustainable",
        label: "Sustainable transition",
        description: "Controlled growth with efficiency-led innovation",
        rates: &[
            ("growth_pop", 0.008),
            ("growth_gdp", 0.032),
            ("growth_urbanization", 0.005),
            ("growth_agri_yield", 0.040),
        ],
    },
];

impl ScenarioPreset {
    pub fn find(id: &str) -> Option<&'static ScenarioPreset> {
        SCENARIO_PRESETS.iter().find(|p| p.id == id)
    }
}
