//! wefe-core: a deterministic Water-Energy-Food-Ecology system-dynamics
//! simulator. One engine, one state store, five subsystems run in a fixed
//! order once per simulated year.

pub mod calibration;
pub mod clock;
pub mod config;
pub mod ecology_subsystem;
pub mod energy_subsystem;
pub mod engine;
pub mod error;
pub mod event;
pub mod food_subsystem;
pub mod macro_subsystem;
pub mod snapshot;
pub mod state;
pub mod store;
pub mod subsystem;
pub mod sweep;
pub mod types;
pub mod water_subsystem;
