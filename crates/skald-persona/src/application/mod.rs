//! Application layer for personas.

pub mod context;
pub mod engine;
