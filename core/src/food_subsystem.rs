//! Food subsystem: human and feed-driven demand against crop and
//! livestock production.
//!
//! Execution: every tick, after Macro.
//! Feeds: Water (ordering only), Energy (grain production, food supply).

use crate::{
    config::Params,
    error::SimResult,
    event::SimEvent,
    state::SimState,
    subsystem::{safe_ratio, SimSubsystem, YearMetrics},
    types::Year,
};
use serde::{Deserialize, Serialize};

/// kg of feed grain per kg of meat (weighted beef/poultry/pork average).
pub const FEED_CONVERSION_MEAT: f64 = 3.5;
/// kg of feed grain per kg of dairy.
pub const FEED_CONVERSION_DAIRY: f64 = 1.2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodMetrics {
    pub food_demand_total: f64,
    pub food_supply_total: f64,
    pub food_ratio: f64,
    pub production_grains: f64,
    pub feed_demand: f64,
}

pub struct FoodSubsystem {
    params: Params,
}

impl FoodSubsystem {
    pub fn new(params: Params) -> Self {
        Self { params }
    }

    pub fn compute(&self, state: &SimState) -> FoodMetrics {
        let p = &self.params;
        let pop = state.population;

        // Direct human demand
        let grains_human = pop * p.diet_grains_per_capita;
        let veggies = pop * p.diet_veggies_per_capita;
        let fruits = pop * p.diet_fruits_per_capita;
        let meat = pop * (p.diet_red_meat_per_capita + p.diet_white_meat_per_capita);
        let dairy = pop * p.diet_dairy_per_capita;

        // Livestock feed is grain demand too
        let feed_demand = meat * FEED_CONVERSION_MEAT + dairy * FEED_CONVERSION_DAIRY;
        let grains_total = grains_human + feed_demand;

        let demand = grains_total + veggies + fruits + meat + dairy;

        let production_grains = state.area_grains * state.yield_grains;
        let supply = production_grains
            + state.area_veggies * state.yield_veggies
            + state.area_fruits * state.yield_fruits
            + state.heads_cows * state.yield_meat
            + state.heads_poultry * state.yield_poultry
            + state.heads_dairy * state.yield_dairy;

        FoodMetrics {
            food_demand_total: demand,
            food_supply_total: supply,
            food_ratio: safe_ratio(supply, demand),
            production_grains,
            feed_demand,
        }
    }
}

impl SimSubsystem for FoodSubsystem {
    fn name(&self) -> &'static str { "food" }

    fn update(
        &mut self,
        year: Year,
        state: &mut SimState,
        metrics: &mut YearMetrics,
    ) -> SimResult<Vec<SimEvent>> {
        let food = self.compute(state);

        log::debug!(
            "year={year} food: demand={:.0} supply={:.0} ratio={:.3}",
            food.food_demand_total,
            food.food_supply_total,
            food.food_ratio
        );

        let mut events = Vec::new();
        if food.food_demand_total > 0.0 && food.food_ratio < 1.0 {
            events.push(SimEvent::FoodDeficit { year, food_ratio: food.food_ratio });
        }

        metrics.food = Some(food);
        Ok(events)
    }
}
