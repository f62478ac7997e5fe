//! Subsystem trait and the per-year output bundle.
//!
//! RULE: Every subsystem implements SimSubsystem.
//! The engine calls update() on each registered subsystem
//! in registration order, every tick.
//! Execution order is fixed and documented in engine.rs.

use crate::{
    ecology_subsystem::EcologyMetrics,
    energy_subsystem::EnergyMetrics,
    error::{SimError, SimResult},
    event::SimEvent,
    food_subsystem::FoodMetrics,
    state::SimState,
    types::Year,
    water_subsystem::WaterMetrics,
};

/// The contract every subsystem must fulfill.
pub trait SimSubsystem: Send {
    /// Unique stable name for this subsystem.
    fn name(&self) -> &'static str;

    /// Called once per tick by the engine.
    ///
    /// - `year`:    the year label being simulated
    /// - `state`:   the run's single mutable state
    /// - `metrics`: outputs produced by earlier subsystems this tick;
    ///              the subsystem records its own output here
    ///
    /// Returns a vec of new events to add to the run's event log.
    fn update(
        &mut self,
        year: Year,
        state: &mut SimState,
        metrics: &mut YearMetrics,
    ) -> SimResult<Vec<SimEvent>>;
}

/// Everything the subsystems derived for one year, filled in pipeline order.
#[derive(Debug, Clone, Default)]
pub struct YearMetrics {
    pub food:    Option<FoodMetrics>,
    pub water:   Option<WaterMetrics>,
    pub energy:  Option<EnergyMetrics>,
    pub ecology: Option<EcologyMetrics>,
}

impl YearMetrics {
    pub fn food(&self, subsystem: &'static str) -> SimResult<&FoodMetrics> {
        self.food.as_ref().ok_or(SimError::SubsystemOrder { subsystem, needs: "food" })
    }

    pub fn water(&self, subsystem: &'static str) -> SimResult<&WaterMetrics> {
        self.water.as_ref().ok_or(SimError::SubsystemOrder { subsystem, needs: "water" })
    }

    pub fn energy(&self, subsystem: &'static str) -> SimResult<&EnergyMetrics> {
        self.energy.as_ref().ok_or(SimError::SubsystemOrder { subsystem, needs: "energy" })
    }

    pub fn ecology(&self, subsystem: &'static str) -> SimResult<&EcologyMetrics> {
        self.ecology.as_ref().ok_or(SimError::SubsystemOrder { subsystem, needs: "ecology" })
    }
}

/// Supply over demand, defined as 0 when there is no demand.
pub fn safe_ratio(supply: f64, demand: f64) -> f64 {
    if demand > 0.0 { supply / demand } else { 0.0 }
}
