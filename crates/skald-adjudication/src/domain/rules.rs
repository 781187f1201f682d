//! Adjudication rules.
//!
//! Rules see the action as it stands after the rules before them, the
//! start-of-turn world and the full proposal set ordered by agent id. A rule
//! must give the same answer whatever order the proposals arrived in.

use std::collections::BTreeSet;

use skald_core::action::{Action, ActionKind, Proposal, Target};
use skald_core::error::DomainError;
use skald_core::reason::ReasonCode;
use skald_core::world::{EntityStatus, WorldState};

/// What a rule decided about one action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleOutcome {
    /// No objection.
    Pass,
    /// Replace the action with a safe fallback.
    Adjust {
        /// The replacement.
        action: Action,
        /// Why.
        reason: ReasonCode,
    },
    /// Refuse the action.
    Reject(ReasonCode),
}

/// Read-only inputs shared by every rule.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    /// The start-of-turn world.
    pub world: &'a WorldState,
    /// Every proposal of the turn, ordered by agent id.
    pub proposals: &'a [Proposal],
    /// The kinds the acting agent may propose.
    pub allowed: &'a BTreeSet<ActionKind>,
}

impl RuleContext<'_> {
    /// Whether the acting agent may propose `kind`.
    #[must_use]
    pub fn allows(&self, kind: ActionKind) -> bool {
        kind == ActionKind::NoOp || self.allowed.contains(&kind)
    }
}

/// A single adjudication rule.
pub trait Rule: Send + Sync {
    /// Name used in logs and error messages.
    fn name(&self) -> &str;

    /// Judges `action`.
    ///
    /// # Errors
    ///
    /// An error means the rule could not reach a decision at all; it halts
    /// the turn.
    fn check(&self, action: &Action, context: &RuleContext<'_>) -> Result<RuleOutcome, DomainError>;
}

/// The action kind must be allowed for the actor, and a downed actor may only
/// rest or do nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct CapabilityRule;

impl Rule for CapabilityRule {
    fn name(&self) -> &str {
        "capability"
    }

    fn check(&self, action: &Action, context: &RuleContext<'_>) -> Result<RuleOutcome, DomainError> {
        if !context.allows(action.kind) {
            return Ok(RuleOutcome::Reject(ReasonCode::NotCapable));
        }
        let downed = context
            .world
            .entity(&action.actor)
            .is_some_and(|e| e.status == EntityStatus::Downed);
        if downed && !matches!(action.kind, ActionKind::Rest | ActionKind::NoOp) {
            return Ok(RuleOutcome::Reject(ReasonCode::ActorIncapacitated));
        }
        Ok(RuleOutcome::Pass)
    }
}

/// Each action kind's world predicate must hold.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreconditionRule;

impl PreconditionRule {
    fn check_move(action: &Action, world: &WorldState) -> RuleOutcome {
        let Some(Target::Location(to)) = &action.target else {
            return RuleOutcome::Reject(ReasonCode::MissingTarget);
        };
        let (Some(actor), Some(_)) = (world.entity(&action.actor), world.location(to)) else {
            return RuleOutcome::Reject(ReasonCode::TargetMissing);
        };
        if &actor.location == to {
            return RuleOutcome::Reject(ReasonCode::AlreadyThere);
        }
        let adjacent = world
            .location(&actor.location)
            .is_some_and(|here| here.exits.contains(to));
        if !adjacent {
            return RuleOutcome::Reject(ReasonCode::TargetUnreachable);
        }
        if !world.has_room(to) {
            return RuleOutcome::Reject(ReasonCode::LocationFull);
        }
        RuleOutcome::Pass
    }

    fn check_attack(action: &Action, context: &RuleContext<'_>) -> RuleOutcome {
        let Some(Target::Entity(foe)) = &action.target else {
            return RuleOutcome::Reject(ReasonCode::MissingTarget);
        };
        if foe == &action.actor {
            return RuleOutcome::Reject(ReasonCode::RuleViolation);
        }
        let present = context.world.entity(foe).is_some_and(|e| {
            e.status == EntityStatus::Active && context.world.co_located(&action.actor, foe)
        });
        if present {
            return RuleOutcome::Pass;
        }
        if context.allows(ActionKind::Observe) {
            let mut observe = action.clone();
            observe.kind = ActionKind::Observe;
            observe.target = None;
            RuleOutcome::Adjust {
                action: observe,
                reason: ReasonCode::TargetVanished,
            }
        } else {
            RuleOutcome::Reject(ReasonCode::TargetVanished)
        }
    }

    fn check_claim(action: &Action, world: &WorldState) -> RuleOutcome {
        let Some(Target::Resource(id)) = &action.target else {
            return RuleOutcome::Reject(ReasonCode::MissingTarget);
        };
        let (Some(actor), Some(resource)) = (world.entity(&action.actor), world.resource(id)) else {
            return RuleOutcome::Reject(ReasonCode::TargetMissing);
        };
        if resource.location != actor.location {
            return RuleOutcome::Reject(ReasonCode::TargetUnreachable);
        }
        if resource.holder.is_some() {
            return RuleOutcome::Reject(ReasonCode::ResourceUnavailable);
        }
        RuleOutcome::Pass
    }

    fn check_speak(action: &Action, world: &WorldState) -> RuleOutcome {
        let Some(Target::Entity(listener)) = &action.target else {
            return RuleOutcome::Reject(ReasonCode::MissingTarget);
        };
        if listener == &action.actor {
            return RuleOutcome::Reject(ReasonCode::RuleViolation);
        }
        if world.entity(listener).is_none() {
            return RuleOutcome::Reject(ReasonCode::TargetMissing);
        }
        if !world.co_located(&action.actor, listener) {
            return RuleOutcome::Reject(ReasonCode::TargetUnreachable);
        }
        RuleOutcome::Pass
    }
}

impl Rule for PreconditionRule {
    fn name(&self) -> &str {
        "precondition"
    }

    fn check(&self, action: &Action, context: &RuleContext<'_>) -> Result<RuleOutcome, DomainError> {
        Ok(match action.kind {
            ActionKind::Move => Self::check_move(action, context.world),
            ActionKind::Attack => Self::check_attack(action, context),
            ActionKind::Claim => Self::check_claim(action, context.world),
            ActionKind::Speak => Self::check_speak(action, context.world),
            ActionKind::Observe | ActionKind::Search | ActionKind::Rest | ActionKind::NoOp => {
                RuleOutcome::Pass
            }
        })
    }
}
