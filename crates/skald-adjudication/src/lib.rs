//! Skald Adjudication — judging proposals against the world.
//!
//! Every proposal gets a verdict from a chain of rules: built-in capability
//! and precondition checks first, then any extension rules. Proposals that
//! survive and claim the same exclusive resource are reported as
//! contentions for the Director to resolve.

pub mod application;
pub mod domain;

pub use application::adjudicator::Adjudicator;
pub use domain::contention::Contention;
pub use domain::ruling::{Adjudication, Capabilities, Ruling};
pub use domain::rules::{Rule, RuleContext, RuleOutcome};
