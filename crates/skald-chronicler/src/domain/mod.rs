//! Domain layer for narration: beats, segments and style templates.

pub mod beat;
pub mod segment;
pub mod template;
