//! Simulation clock: owns the year counter and the run phase.

use crate::types::Year;
use serde::{Deserialize, Serialize};

/// Lifecycle of a single run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    Initialized,
    Ticking,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimClock {
    pub base_year:     Year,
    pub current_year:  Year,
    pub ticks_elapsed: u32,
    pub phase:         RunPhase,
}

impl SimClock {
    pub fn new(base_year: Year) -> Self {
        Self {
            base_year,
            current_year: base_year,
            ticks_elapsed: 0,
            phase: RunPhase::Initialized,
        }
    }

    /// Move to the next year. Returns the new year label.
    /// Panics unless the run is ticking; callers must check.
    pub fn advance(&mut self) -> Year {
        assert_eq!(self.phase, RunPhase::Ticking, "advance() called outside a run");
        self.current_year += 1;
        self.ticks_elapsed += 1;
        self.current_year
    }

    pub fn start(&mut self)    { self.phase = RunPhase::Ticking;   }
    pub fn complete(&mut self) { self.phase = RunPhase::Completed; }

    pub fn is_ticking(&self) -> bool {
        self.phase == RunPhase::Ticking
    }
}
