//! The adjudication engine.

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use skald_core::action::{ActionKind, Proposal};
use skald_core::error::DomainError;
use skald_core::verdict::Verdict;
use skald_core::world::WorldState;
use tracing::{debug, instrument};

use crate::domain::contention;
use crate::domain::rules::{CapabilityRule, PreconditionRule, Rule, RuleContext, RuleOutcome};
use crate::domain::ruling::{Adjudication, Capabilities, Ruling};

/// Runs the rule chain over a proposal set. Read-only with respect to the
/// world.
pub struct Adjudicator {
    rules: Vec<Box<dyn Rule>>,
}

impl fmt::Debug for Adjudicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Adjudicator")
            .field("rules", &self.rules.iter().map(|r| r.name()).collect::<Vec<_>>())
            .finish()
    }
}

impl Default for Adjudicator {
    fn default() -> Self {
        Self::new()
    }
}

impl Adjudicator {
    /// An adjudicator with the built-in capability and precondition rules.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rules: vec![Box::new(CapabilityRule), Box::new(PreconditionRule)],
        }
    }

    /// Appends an extension rule; extensions run after the built-ins, in the
    /// order they were added.
    #[must_use]
    pub fn with_rule(mut self, rule: impl Rule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Names of the rules, in evaluation order.
    pub fn rule_names(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.name())
    }

    /// Gives every proposal a verdict and reports contended resources.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Adjudication` if a proposal's actor has no
    /// entity in the world, an actor proposed twice, or a rule failed.
    #[instrument(skip_all, fields(proposals = proposals.len()))]
    pub fn adjudicate(
        &self,
        world: &WorldState,
        proposals: &[Proposal],
        capabilities: &Capabilities,
    ) -> Result<Adjudication, DomainError> {
        let mut seen = HashSet::new();
        for proposal in proposals {
            let actor = proposal.actor();
            if world.entity(actor).is_none() {
                return Err(DomainError::Adjudication(format!(
                    "proposal from `{actor}`, who has no entity in the world"
                )));
            }
            if !seen.insert(actor) {
                return Err(DomainError::Adjudication(format!(
                    "`{actor}` submitted more than one proposal"
                )));
            }
        }

        let mut ordered = proposals.to_vec();
        ordered.sort_by(|a, b| a.actor().cmp(b.actor()));

        let none = BTreeSet::new();
        let mut rulings = Vec::with_capacity(proposals.len());
        for proposal in proposals {
            let context = RuleContext {
                world,
                proposals: &ordered,
                allowed: capabilities.get(proposal.actor()).unwrap_or(&none),
            };
            rulings.push(self.judge(proposal, &context)?);
        }

        let contentions = contention::detect(&rulings, world);
        debug!(
            proposals = rulings.len(),
            rejected = rulings.iter().filter(|r| r.verdict.is_rejected()).count(),
            contentions = contentions.len(),
            "adjudicated proposal set"
        );
        Ok(Adjudication {
            rulings,
            contentions,
        })
    }

    fn judge(&self, proposal: &Proposal, context: &RuleContext<'_>) -> Result<Ruling, DomainError> {
        let mut action = proposal.action.clone();
        let mut adjusted: Option<(ActionKind, _)> = None;

        for rule in &self.rules {
            let outcome = rule.check(&action, context).map_err(|e| {
                DomainError::Adjudication(format!(
                    "rule `{}` failed on `{}`: {e}",
                    rule.name(),
                    action.actor
                ))
            })?;
            match outcome {
                RuleOutcome::Pass => {}
                RuleOutcome::Adjust {
                    action: replacement,
                    reason,
                } => {
                    adjusted.get_or_insert((proposal.action.kind, reason));
                    action = replacement;
                }
                RuleOutcome::Reject(reason) => {
                    return Ok(Ruling {
                        proposal: proposal.clone(),
                        action: proposal.action.clone(),
                        verdict: Verdict::Rejected { reason },
                    });
                }
            }
        }

        let verdict = match adjusted {
            Some((original, reason)) => Verdict::Adjusted { original, reason },
            None => Verdict::Legal,
        };
        Ok(Ruling {
            proposal: proposal.clone(),
            action,
            verdict,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skald_core::action::{Action, Target};
    use skald_core::ids::{AgentId, EntityId, LocationId, ResourceId};
    use skald_core::reason::ReasonCode;
    use skald_core::world::ResourceKey;
    use skald_test_support::WorldBuilder;

    fn world() -> WorldState {
        WorldBuilder::new()
            .location("hall", None)
            .location("vault", Some(1))
            .connect("hall", "vault")
            .entity("aria", "Aria", "hall")
            .entity("borin", "Borin", "hall")
            .entity("cole", "Cole", "hall")
            .resource("idol", "hall")
            .build()
    }

    fn capabilities() -> Capabilities {
        ["aria", "borin", "cole"]
            .into_iter()
            .map(|id| (AgentId::new(id), ActionKind::ALL.into_iter().collect()))
            .collect()
    }

    fn claim(actor: &str, resource: &str) -> Proposal {
        Proposal::reasoned(
            Action::new(EntityId::new(actor), ActionKind::Claim, 0)
                .with_target(Target::Resource(ResourceId::new(resource))),
        )
    }

    fn enter(actor: &str, location: &str) -> Proposal {
        Proposal::reasoned(
            Action::new(EntityId::new(actor), ActionKind::Move, 0)
                .with_target(Target::Location(LocationId::new(location))),
        )
    }

    #[test]
    fn test_contention_reported_for_shared_resource() {
        // Arrange
        let proposals = vec![claim("borin", "idol"), claim("aria", "idol"), enter("cole", "vault")];

        // Act
        let result = Adjudicator::new()
            .adjudicate(&world(), &proposals, &capabilities())
            .unwrap();

        // Assert
        assert!(result.rulings.iter().all(|r| r.verdict == Verdict::Legal));
        assert_eq!(result.contentions.len(), 1);
        assert_eq!(
            result.contentions[0].resource,
            ResourceKey::Resource(ResourceId::new("idol"))
        );
        assert_eq!(
            result.contentions[0].contenders,
            vec![AgentId::new("aria"), AgentId::new("borin")]
        );
    }

    #[test]
    fn test_two_movers_contend_for_capped_location() {
        let proposals = vec![enter("aria", "vault"), enter("borin", "vault")];

        let result = Adjudicator::new()
            .adjudicate(&world(), &proposals, &capabilities())
            .unwrap();

        assert_eq!(
            result.contentions[0].resource,
            ResourceKey::Location(LocationId::new("vault"))
        );
    }

    #[test]
    fn test_verdicts_do_not_depend_on_input_order() {
        let forward = vec![
            claim("aria", "idol"),
            claim("borin", "idol"),
            enter("cole", "hall"),
        ];
        let mut backward = forward.clone();
        backward.reverse();
        let adjudicator = Adjudicator::new();

        let a = adjudicator
            .adjudicate(&world(), &forward, &capabilities())
            .unwrap();
        let b = adjudicator
            .adjudicate(&world(), &backward, &capabilities())
            .unwrap();

        for actor in ["aria", "borin", "cole"] {
            let actor = AgentId::new(actor);
            assert_eq!(
                a.ruling_for(&actor).map(|r| &r.verdict),
                b.ruling_for(&actor).map(|r| &r.verdict)
            );
        }
        assert_eq!(a.contentions, b.contentions);
    }

    #[test]
    fn test_rejected_proposals_do_not_contend() {
        let mut caps = capabilities();
        caps.insert(AgentId::new("borin"), BTreeSet::new());
        let proposals = vec![claim("aria", "idol"), claim("borin", "idol")];

        let result = Adjudicator::new()
            .adjudicate(&world(), &proposals, &caps)
            .unwrap();

        assert_eq!(
            result.ruling_for(&AgentId::new("borin")).unwrap().verdict,
            Verdict::Rejected {
                reason: ReasonCode::NotCapable
            }
        );
        assert!(result.contentions.is_empty());
    }

    #[test]
    fn test_unknown_actor_is_fatal() {
        let proposals = vec![claim("ghost", "idol")];

        let result = Adjudicator::new().adjudicate(&world(), &proposals, &capabilities());

        assert!(matches!(result, Err(DomainError::Adjudication(_))));
    }

    #[test]
    fn test_duplicate_actor_is_fatal() {
        let proposals = vec![claim("aria", "idol"), enter("aria", "vault")];

        let result = Adjudicator::new().adjudicate(&world(), &proposals, &capabilities());

        assert!(matches!(result, Err(DomainError::Adjudication(_))));
    }

    struct NoSpeakingInVault;

    impl Rule for NoSpeakingInVault {
        fn name(&self) -> &str {
            "vow-of-silence"
        }

        fn check(&self, action: &Action, _context: &RuleContext<'_>) -> Result<RuleOutcome, DomainError> {
            Ok(if action.kind == ActionKind::Speak {
                RuleOutcome::Reject(ReasonCode::RuleViolation)
            } else {
                RuleOutcome::Pass
            })
        }
    }

    struct Broken;

    impl Rule for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn check(&self, _action: &Action, _context: &RuleContext<'_>) -> Result<RuleOutcome, DomainError> {
            Err(DomainError::Validation("lookup table missing".into()))
        }
    }

    #[test]
    fn test_extension_rules_run_after_builtins() {
        let adjudicator = Adjudicator::new().with_rule(NoSpeakingInVault);
        let speak = Proposal::reasoned(
            Action::new(EntityId::new("aria"), ActionKind::Speak, 0)
                .with_target(Target::Entity(EntityId::new("borin"))),
        );

        let result = adjudicator
            .adjudicate(&world(), &[speak], &capabilities())
            .unwrap();

        assert_eq!(
            adjudicator.rule_names().collect::<Vec<_>>(),
            vec!["capability", "precondition", "vow-of-silence"]
        );
        assert_eq!(
            result.rulings[0].verdict,
            Verdict::Rejected {
                reason: ReasonCode::RuleViolation
            }
        );
    }

    #[test]
    fn test_failing_extension_rule_is_fatal() {
        let adjudicator = Adjudicator::new().with_rule(Broken);

        let result = adjudicator.adjudicate(&world(), &[claim("aria", "idol")], &capabilities());

        match result {
            Err(DomainError::Adjudication(message)) => assert!(message.contains("broken")),
            other => panic!("expected Adjudication error, got {other:?}"),
        }
    }
}
