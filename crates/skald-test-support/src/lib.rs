//! Shared test fakes and fixtures for the Skald simulation engine.

mod clock;
mod log;
mod prose;
mod reasoning;
mod records;
mod world;

pub use clock::{FixedClock, fixed_clock};
pub use log::FlakyCampaignLog;
pub use prose::{EchoProseGenerator, FailingProseGenerator, NamelessProseGenerator};
pub use reasoning::{
    ScriptedReasoningService, SlowReasoningService, StalledReasoningService,
    UnreachableReasoningService,
};
pub use records::idle_turn;
pub use world::WorldBuilder;
