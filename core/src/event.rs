//! The engine event log: notable transitions recorded during a run.
//!
//! RULE: events describe what happened; they never feed back into the
//! simulation. Subsystems exchange data through `YearMetrics`, not events.

use crate::types::{RunId, Year};
use serde::{Deserialize, Serialize};

/// Every event emitted during simulation.
/// Variants are added over time, never removed or reordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimEvent {
    // ── Engine events ──────────────────────────────
    RunInitialized {
        run_id:    RunId,
        base_year: Year,
        years:     u32,
    },
    YearStarted {
        year: Year,
    },
    YearCompleted {
        year: Year,
    },

    // ── Subsystem events ───────────────────────────
    MacroDriversUpdated {
        year:              Year,
        population:        f64,
        gdp:               f64,
        urbanization_rate: f64,
    },
    FoodDeficit {
        year:       Year,
        food_ratio: f64,
    },
    EnergyRegimeSwitched {
        year:        Year,
        growth_rate: f64,
    },
    RenewablesExceedSupply {
        year:              Year,
        supply_renewables: f64,
        energy_supply:     f64,
    },

    // ── Feedback events ────────────────────────────
    GroundwaterDrawn {
        year:        Year,
        water_ratio: f64,
        drawn:       f64,
        remaining:   f64,
    },
    AquiferExhausted {
        year: Year,
    },
}

impl SimEvent {
    /// Stable string name for the event_type column.
    pub fn type_name(&self) -> &'static str {
        match self {
            SimEvent::RunInitialized { .. }         => "run_initialized",
            SimEvent::YearStarted { .. }            => "year_started",
            SimEvent::YearCompleted { .. }          => "year_completed",
            SimEvent::MacroDriversUpdated { .. }    => "macro_drivers_updated",
            SimEvent::FoodDeficit { .. }            => "food_deficit",
            SimEvent::EnergyRegimeSwitched { .. }   => "energy_regime_switched",
            SimEvent::RenewablesExceedSupply { .. } => "renewables_exceed_supply",
            SimEvent::GroundwaterDrawn { .. }       => "groundwater_drawn",
            SimEvent::AquiferExhausted { .. }       => "aquifer_exhausted",
        }
    }
}

/// A logged event with its position in the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id:         Option<i64>,
    pub run_id:     RunId,
    pub year:       Year,
    pub subsystem:  String,
    pub event_type: String,
    pub payload:    String,
}
