//! The simulation engine: one run of the WEFE model.
//!
//! EXECUTION ORDER (fixed):
//!   1. Macro subsystem
//!   2. Food subsystem
//!   3. Water subsystem
//!   4. Energy subsystem
//!   5. Ecology subsystem
//!   then: snapshot, groundwater feedback, year advance.
//!
//! RULES:
//!   - Subsystems execute in registration order, every tick.
//!   - A subsystem reads earlier outputs only through YearMetrics.
//!   - The engine owns the run's only SimState; nothing is shared
//!     between engines.
//!   - A run is all-or-nothing: any error aborts it and no partial
//!     table is returned.

use crate::{
    calibration::{self, CalibrationReport, ReferenceTable},
    clock::{RunPhase, SimClock},
    config::SimConfig,
    ecology_subsystem::EcologySubsystem,
    energy_subsystem::EnergySubsystem,
    error::{SimError, SimResult},
    event::{EventLogEntry, SimEvent},
    food_subsystem::FoodSubsystem,
    macro_subsystem::MacroSubsystem,
    snapshot::{ResultTable, YearSnapshot},
    state::{DerivedConstants, SimState},
    subsystem::{SimSubsystem, YearMetrics},
    types::{RunId, Year, MAX_YEARS},
    water_subsystem::WaterSubsystem,
};

/// Below this water ratio some regions are assumed to over-extract
/// even if the national average looks adequate.
pub const WATER_STRESS_THRESHOLD: f64 = 3.0;
/// Share of human water demand drawn from aquifers under stress.
pub const REGIONAL_DEPLETION_FACTOR: f64 = 0.005;

pub struct SimEngine {
    pub run_id: RunId,
    pub clock:  SimClock,
    constants:  DerivedConstants,
    state:      SimState,
    subsystems: Vec<Box<dyn SimSubsystem>>,
    history:    Vec<YearSnapshot>,
    event_log:  Vec<EventLogEntry>,
}

impl SimEngine {
    pub fn new(run_id: RunId, config: &SimConfig) -> Self {
        Self {
            clock:      SimClock::new(config.initial.year),
            constants:  DerivedConstants::from_initial(&config.initial),
            state:      SimState::from_initial(&config.initial),
            subsystems: Vec::new(),
            history:    Vec::new(),
            event_log:  Vec::new(),
            run_id,
        }
    }

    /// Build a fully wired engine with all subsystems registered.
    /// Call this instead of new() + manual register() calls.
    pub fn build(run_id: RunId, config: &SimConfig) -> Self {
        let mut engine = SimEngine::new(run_id, config);
        let constants = engine.constants;

        // EXECUTION ORDER: see module docs.
        engine.register(Box::new(MacroSubsystem::new(config.scenarios.clone())));
        engine.register(Box::new(FoodSubsystem::new(config.params.clone())));
        engine.register(Box::new(WaterSubsystem::new(config.params.clone())));
        engine.register(Box::new(EnergySubsystem::new(
            config.params.clone(),
            config.scenarios.clone(),
            constants,
        )));
        engine.register(Box::new(EcologySubsystem::new(
            config.params.clone(),
            config.scenarios.clone(),
        )));
        engine
    }

    /// Engine over the hardcoded test configuration.
    pub fn build_test(run_id: RunId) -> SimResult<Self> {
        let config = SimConfig::default_test()?;
        Ok(Self::build(run_id, &config))
    }

    /// Register a subsystem. Call in the documented execution order.
    pub fn register(&mut self, subsystem: Box<dyn SimSubsystem>) {
        self.subsystems.push(subsystem);
    }

    pub fn state(&self) -> &SimState {
        &self.state
    }

    pub fn constants(&self) -> &DerivedConstants {
        &self.constants
    }

    pub fn event_log(&self) -> &[EventLogEntry] {
        &self.event_log
    }

    pub fn events_for_year(&self, year: Year) -> Vec<&EventLogEntry> {
        self.event_log.iter().filter(|e| e.year == year).collect()
    }

    /// Advance one year. This is the core simulation step.
    pub fn tick(&mut self) -> SimResult<YearSnapshot> {
        assert!(self.clock.is_ticking(), "tick() called outside a run");

        let year = self.clock.current_year;
        self.record(year, "engine", SimEvent::YearStarted { year })?;

        let mut metrics = YearMetrics::default();
        let mut produced: Vec<(&'static str, SimEvent)> = Vec::new();
        for subsystem in &mut self.subsystems {
            let name = subsystem.name();
            let events = subsystem.update(year, &mut self.state, &mut metrics)?;
            produced.extend(events.into_iter().map(|e| (name, e)));
        }
        for (name, event) in produced {
            self.record(year, name, event)?;
        }

        let snapshot = self.take_snapshot(metrics)?;
        self.history.push(snapshot.clone());

        self.apply_groundwater_feedback(
            year,
            snapshot.water.water_ratio,
            snapshot.water.water_demand,
        )?;

        self.record(year, "engine", SimEvent::YearCompleted { year })?;
        self.state.year = self.clock.advance();

        Ok(snapshot)
    }

    /// Run `years` ticks and return the result table.
    pub fn run(&mut self, years: u32) -> SimResult<ResultTable> {
        let years = validate_years(i64::from(years))?;
        if self.clock.phase != RunPhase::Initialized {
            return Err(SimError::RunCompleted);
        }

        log::info!(
            "run {}: {} years from {}",
            self.run_id,
            years,
            self.clock.base_year
        );
        let init = SimEvent::RunInitialized {
            run_id:    self.run_id.clone(),
            base_year: self.clock.base_year,
            years,
        };
        self.record(self.clock.base_year, "engine", init)?;

        self.clock.start();
        let outcome = (0..years).try_for_each(|_| self.tick().map(|_| ()));
        self.clock.complete();

        match outcome {
            Ok(()) => {
                log::info!(
                    "run {} completed at year {}",
                    self.run_id,
                    self.clock.current_year - 1
                );
                Ok(ResultTable { rows: std::mem::take(&mut self.history) })
            }
            Err(e) => {
                self.history.clear();
                Err(e)
            }
        }
    }

    /// Run for as many years as the reference has rows and score the
    /// default variable mapping against it.
    pub fn calibrate(&mut self, reference: &ReferenceTable) -> SimResult<CalibrationReport> {
        if reference.is_empty() {
            return Err(SimError::EmptyReference);
        }
        let years = validate_years(reference.len() as i64)?;
        let table = self.run(years)?;
        calibration::score(&table, reference, &calibration::default_mapping())
    }

    fn take_snapshot(&self, metrics: YearMetrics) -> SimResult<YearSnapshot> {
        let YearMetrics { food, water, energy, ecology } = metrics;
        let missing = |needs| SimError::SubsystemOrder { subsystem: "engine", needs };
        Ok(YearSnapshot {
            state:   self.state.clone(),
            food:    food.ok_or_else(|| missing("food"))?,
            water:   water.ok_or_else(|| missing("water"))?,
            energy:  energy.ok_or_else(|| missing("energy"))?,
            ecology: ecology.ok_or_else(|| missing("ecology"))?,
        })
    }

    /// Slow aquifer depletion under latent regional water stress.
    fn apply_groundwater_feedback(
        &mut self,
        year: Year,
        water_ratio: f64,
        water_demand: f64,
    ) -> SimResult<()> {
        if water_ratio >= WATER_STRESS_THRESHOLD {
            return Ok(());
        }

        let had_water = self.state.ws_ground > 0.0;
        let drawn = self.state.draw_groundwater(water_demand * REGIONAL_DEPLETION_FACTOR);
        let remaining = self.state.ws_ground;
        self.record(year, "engine", SimEvent::GroundwaterDrawn {
            year,
            water_ratio,
            drawn,
            remaining,
        })?;

        if had_water && remaining == 0.0 {
            log::warn!("year={year} groundwater stock exhausted");
            self.record(year, "engine", SimEvent::AquiferExhausted { year })?;
        }
        Ok(())
    }

    fn record(&mut self, year: Year, subsystem: &str, event: SimEvent) -> SimResult<()> {
        let entry = EventLogEntry {
            id:         None,
            run_id:     self.run_id.clone(),
            year,
            subsystem:  subsystem.to_string(),
            event_type: event.type_name().to_string(),
            payload:    serde_json::to_string(&event)?,
        };
        self.event_log.push(entry);
        Ok(())
    }
}

/// Reject horizons outside [1, MAX_YEARS] before any state is built.
pub fn validate_years(years: i64) -> SimResult<u32> {
    if (1..=i64::from(MAX_YEARS)).contains(&years) {
        Ok(years as u32)
    } else {
        Err(SimError::InvalidYears { years })
    }
}

/// Validate, build a fresh engine, and run it.
pub fn simulate(run_id: RunId, config: &SimConfig, years: i64) -> SimResult<ResultTable> {
    let years = validate_years(years)?;
    SimEngine::build(run_id, config).run(years)
}
