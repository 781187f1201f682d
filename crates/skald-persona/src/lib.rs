//! Skald Persona — the agents of a simulation.
//!
//! Responsible for character profiles, bounded decision histories, role
//! strategies and the decision engine that turns a world snapshot into a
//! proposal.

pub mod application;
pub mod domain;

pub use application::engine::{DecisionEngine, EngineConfig};
pub use domain::agent::{Agent, DecisionRequest, Persona};
pub use domain::history::{DecisionHistory, Experience};
pub use domain::profile::{CharacterProfile, ProfileFormat};
