//! Shared primitive types used across the entire simulation.

/// A simulation year label. One tick = one calendar year.
pub type Year = i32;

/// The canonical run identifier.
pub type RunId = String;

/// Largest horizon a single run accepts.
pub const MAX_YEARS: u32 = 100;
