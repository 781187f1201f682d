//! Machine-readable reason codes.
//!
//! Every recoverable degradation (a timed-out decision, a fallback, a
//! rejected or adjusted action) carries one of these codes into the turn
//! record so it is never silently dropped.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Why a proposal, verdict or narrative segment deviated from the happy path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    // Decision collection.
    /// The agent did not produce a decision before its deadline.
    Timeout,
    /// The decision task panicked or was aborted.
    DecisionFailed,

    // Reasoning service.
    /// No reasoning service is configured.
    NoService,
    /// The reasoning service did not answer within the service timeout.
    ServiceTimeout,
    /// The reasoning service could not be reached or returned an error status.
    ServiceUnavailable,
    /// The reasoning service rejected the call because of rate limiting.
    RateLimited,
    /// The reasoning service answered with something that could not be parsed.
    MalformedResponse,
    /// The reasoning service chose an action that was not offered.
    UnknownChoice,

    // Adjudication.
    /// The action kind is not in the actor's allowed set.
    NotCapable,
    /// The actor is downed and may only rest or wait.
    ActorIncapacitated,
    /// The action needs a target and none (or the wrong kind) was given.
    MissingTarget,
    /// The target does not exist in the world.
    TargetMissing,
    /// The target exists but cannot be reached from the actor's location.
    TargetUnreachable,
    /// The attack target disappeared; the attack became an observation.
    TargetVanished,
    /// The actor is already at the destination.
    AlreadyThere,
    /// The destination has no free capacity.
    LocationFull,
    /// The resource is already held.
    ResourceUnavailable,
    /// Another proposal won the tie-break for the same exclusive resource.
    Contention,
    /// An extension rule rejected or adjusted the action.
    RuleViolation,

    // Transcription.
    /// No prose generator is configured.
    NoGenerator,
    /// The prose generator failed or timed out.
    GenerationFailed,
    /// The generated prose omitted a required character name.
    MissingCharacter,
}

impl ReasonCode {
    /// Returns the snake-case code used in logs and persisted records.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::DecisionFailed => "decision_failed",
            Self::NoService => "no_service",
            Self::ServiceTimeout => "service_timeout",
            Self::ServiceUnavailable => "service_unavailable",
            Self::RateLimited => "rate_limited",
            Self::MalformedResponse => "malformed_response",
            Self::UnknownChoice => "unknown_choice",
            Self::NotCapable => "not_capable",
            Self::ActorIncapacitated => "actor_incapacitated",
            Self::MissingTarget => "missing_target",
            Self::TargetMissing => "target_missing",
            Self::TargetUnreachable => "target_unreachable",
            Self::TargetVanished => "target_vanished",
            Self::AlreadyThere => "already_there",
            Self::LocationFull => "location_full",
            Self::ResourceUnavailable => "resource_unavailable",
            Self::Contention => "contention",
            Self::RuleViolation => "rule_violation",
            Self::NoGenerator => "no_generator",
            Self::GenerationFailed => "generation_failed",
            Self::MissingCharacter => "missing_character",
        }
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_str_matches_serialized_form() {
        for code in [
            ReasonCode::Timeout,
            ReasonCode::ServiceUnavailable,
            ReasonCode::TargetVanished,
            ReasonCode::MissingCharacter,
        ] {
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json, format!("\"{}\"", code.as_str()));
        }
    }
}
