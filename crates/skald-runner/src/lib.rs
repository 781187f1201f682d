//! Skald runner — loads a scenario, runs the simulation and prints the
//! chronicle.

pub mod campaign;
pub mod config;
pub mod error;
pub mod scenario;

pub use campaign::{Campaign, Services, open_log};
pub use config::{LogBackend, RunnerConfig};
pub use error::AppError;
pub use scenario::Scenario;
