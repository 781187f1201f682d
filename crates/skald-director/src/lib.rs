//! Skald Director — the turn orchestrator.
//!
//! Drives every turn through collection, validation, resolution, apply and
//! logging; owns the authoritative world state and the agent registry.

pub mod application;
pub mod domain;

pub use application::director::{CancelSignal, Director};
pub use domain::config::DirectorConfig;
pub use domain::error::RunError;
pub use domain::report::{RunOutcome, RunReport};
pub use domain::state::{DirectorState, DirectorStatus};
