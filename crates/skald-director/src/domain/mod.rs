//! Domain layer for the Director: lifecycle states, configuration, the
//! agent registry and run results.

pub mod config;
pub mod error;
pub mod registry;
pub mod report;
pub mod state;
