//! Domain layer for personas: profiles, histories, strategies, candidates.

pub mod agent;
pub mod candidate;
pub mod history;
pub mod profile;
pub mod strategy;
