//! Agents: a profile, a bounded memory and the persona that decides for it.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use skald_core::action::Proposal;
use skald_core::error::DomainError;
use skald_core::ids::{AgentId, TurnNumber};
use skald_core::world::WorldState;

use super::history::{DecisionHistory, Experience};
use super::profile::CharacterProfile;

/// Everything a persona needs to decide one turn. Owned so it can be moved
/// into a decision task.
#[derive(Debug, Clone)]
pub struct DecisionRequest {
    /// The turn being decided.
    pub turn: TurnNumber,
    /// The deciding character.
    pub profile: Arc<CharacterProfile>,
    /// Immutable start-of-turn snapshot shared by every agent.
    pub snapshot: Arc<WorldState>,
    /// The agent's remembered experiences, oldest first.
    pub history: Vec<Experience>,
}

/// Something that turns a world snapshot into a proposal.
///
/// Implementations never fail: problems are folded into the proposal's
/// origin. The caller bounds the call with its own deadline.
#[async_trait]
pub trait Persona: Send + Sync {
    /// Proposes an action for `request.profile`.
    async fn decide(&self, request: &DecisionRequest) -> Proposal;
}

/// A registered participant in the simulation.
pub struct Agent {
    profile: Arc<CharacterProfile>,
    history: DecisionHistory,
    persona: Arc<dyn Persona>,
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("id", &self.profile.id)
            .field("name", &self.profile.name)
            .field("history", &self.history.len())
            .finish_non_exhaustive()
    }
}

impl Agent {
    /// Creates an agent. The profile's own history capacity wins over
    /// `default_capacity`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::MalformedProfile` if the profile is invalid.
    pub fn new(
        profile: CharacterProfile,
        persona: Arc<dyn Persona>,
        default_capacity: usize,
    ) -> Result<Self, DomainError> {
        profile.validate()?;
        let capacity = profile.history_capacity.unwrap_or(default_capacity);
        if capacity == 0 {
            return Err(DomainError::MalformedProfile {
                profile: profile.id.to_string(),
                reason: "history capacity must be at least 1".into(),
            });
        }
        Ok(Self {
            profile: Arc::new(profile),
            history: DecisionHistory::new(capacity),
            persona,
        })
    }

    /// The agent id.
    #[must_use]
    pub fn id(&self) -> &AgentId {
        &self.profile.id
    }

    /// The canonical character name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.profile.name
    }

    /// The character profile.
    #[must_use]
    pub fn profile(&self) -> &Arc<CharacterProfile> {
        &self.profile
    }

    /// The decision history.
    #[must_use]
    pub fn history(&self) -> &DecisionHistory {
        &self.history
    }

    /// The persona deciding for this agent.
    #[must_use]
    pub fn persona(&self) -> Arc<dyn Persona> {
        Arc::clone(&self.persona)
    }

    /// Builds the request for one turn's decision.
    #[must_use]
    pub fn decision_request(&self, turn: TurnNumber, snapshot: Arc<WorldState>) -> DecisionRequest {
        DecisionRequest {
            turn,
            profile: Arc::clone(&self.profile),
            snapshot,
            history: self.history.snapshot(),
        }
    }

    /// Remembers the outcome of a turn.
    pub fn remember(&mut self, experience: Experience) {
        self.history.record(experience);
    }

    /// Forgets everything, e.g. before replaying a campaign log.
    pub fn forget(&mut self) {
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skald_core::verdict::Verdict;
    use skald_core::action::{Action, ActionKind};

    #[derive(Debug)]
    struct Idle;

    #[async_trait]
    impl Persona for Idle {
        async fn decide(&self, request: &DecisionRequest) -> Proposal {
            Proposal::reasoned(Action::no_op(request.profile.id.clone()))
        }
    }

    fn profile(capacity: Option<usize>) -> CharacterProfile {
        let mut profile = CharacterProfile::from_json_str(
            r#"{"id": "aria", "name": "Aria", "allowed_actions": ["observe"]}"#,
        )
        .unwrap();
        profile.history_capacity = capacity;
        profile
    }

    fn experience(turn: u64) -> Experience {
        Experience {
            turn: TurnNumber::new(turn),
            kind: ActionKind::Observe,
            target: None,
            verdict: Verdict::Legal,
        }
    }

    #[test]
    fn test_profile_capacity_overrides_default() {
        let mut agent = Agent::new(profile(Some(2)), Arc::new(Idle), 16).unwrap();

        for turn in 1..=4 {
            agent.remember(experience(turn));
        }

        assert_eq!(agent.history().capacity(), 2);
        assert_eq!(agent.history().len(), 2);
    }

    #[test]
    fn test_zero_default_capacity_is_rejected() {
        let result = Agent::new(profile(None), Arc::new(Idle), 0);

        assert!(matches!(result, Err(DomainError::MalformedProfile { .. })));
    }

    #[tokio::test]
    async fn test_decision_request_carries_history_snapshot() {
        let mut agent = Agent::new(profile(None), Arc::new(Idle), 4).unwrap();
        agent.remember(experience(1));
        let world = Arc::new(skald_test_support::WorldBuilder::new().build());

        let request = agent.decision_request(TurnNumber::new(2), world);
        let proposal = agent.persona().decide(&request).await;

        assert_eq!(request.history, vec![experience(1)]);
        assert_eq!(proposal.actor(), agent.id());
    }
}
