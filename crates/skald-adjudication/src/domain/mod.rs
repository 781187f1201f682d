//! Domain layer for adjudication.

pub mod contention;
pub mod rules;
pub mod ruling;
