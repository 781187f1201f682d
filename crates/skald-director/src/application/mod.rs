//! Application layer for the Director: the turn pipeline.

pub mod apply;
pub mod collection;
pub mod director;
pub mod replay;
pub mod resolution;
