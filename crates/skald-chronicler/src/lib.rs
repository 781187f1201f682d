//! Skald Chronicler — the transcription engine.
//!
//! Renders committed turn records as narrative segments, through an
//! optional prose generator with a deterministic template fallback.

pub mod application;
pub mod domain;

pub use application::chronicler::{Chronicler, ChroniclerConfig};
pub use domain::segment::{NarrativeSegment, SegmentSource};
