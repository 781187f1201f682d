//! Role-based decision strategies.
//!
//! A strategy supplies the default weight of each action kind and the
//! situational adjustments applied on top of it. Profiles may override the
//! base weights per kind.

use std::fmt;
use std::sync::Arc;

use skald_core::action::{ActionKind, Target};

use super::candidate::Situation;

/// Scores candidate actions for one style of character.
pub trait DecisionStrategy: fmt::Debug + Send + Sync {
    /// Short name, for logs.
    fn name(&self) -> &'static str;

    /// Default weight of `kind` before situational adjustment.
    fn base_weight(&self, kind: ActionKind) -> i32;

    /// Bonus for moving somewhere the character has not recently been.
    fn novelty_bonus(&self) -> i32 {
        5
    }

    /// Situational adjustment added to the base weight.
    fn adjustment(&self, kind: ActionKind, target: Option<&Target>, situation: &Situation<'_>) -> i32 {
        common_adjustment(self.novelty_bonus(), kind, target, situation)
    }
}

/// Adjustments shared by every built-in strategy.
#[must_use]
pub fn common_adjustment(
    novelty_bonus: i32,
    kind: ActionKind,
    target: Option<&Target>,
    situation: &Situation<'_>,
) -> i32 {
    match (kind, target) {
        (ActionKind::Rest, _) => {
            let missing = situation.me.max_health - situation.me.health;
            if missing > 0 { missing * 8 } else { -30 }
        }
        (ActionKind::Move, Some(Target::Location(to))) if !situation.recently_visited(to) => {
            novelty_bonus
        }
        (ActionKind::Search, _) if situation.last_kind() == Some(ActionKind::Search) => -15,
        _ => 0,
    }
}

/// Weighs every kind evenly; the default for unknown roles.
#[derive(Debug, Clone, Copy, Default)]
pub struct Balanced;

impl DecisionStrategy for Balanced {
    fn name(&self) -> &'static str {
        "balanced"
    }

    fn base_weight(&self, kind: ActionKind) -> i32 {
        match kind {
            ActionKind::Move => 40,
            ActionKind::Claim => 35,
            ActionKind::Observe | ActionKind::Search => 30,
            ActionKind::Speak => 25,
            ActionKind::Attack => 20,
            ActionKind::Rest => 10,
            ActionKind::NoOp => 0,
        }
    }
}

/// Prefers fighting and grabbing things.
#[derive(Debug, Clone, Copy, Default)]
pub struct Aggressive;

impl DecisionStrategy for Aggressive {
    fn name(&self) -> &'static str {
        "aggressive"
    }

    fn base_weight(&self, kind: ActionKind) -> i32 {
        match kind {
            ActionKind::Attack => 70,
            ActionKind::Claim => 40,
            ActionKind::Move => 35,
            ActionKind::Observe => 15,
            ActionKind::Search | ActionKind::Speak => 10,
            ActionKind::Rest => 5,
            ActionKind::NoOp => 0,
        }
    }

    fn adjustment(&self, kind: ActionKind, target: Option<&Target>, situation: &Situation<'_>) -> i32 {
        let base = common_adjustment(self.novelty_bonus(), kind, target, situation);
        let wounded_foe = match (kind, target) {
            (ActionKind::Attack, Some(Target::Entity(id))) => situation
                .world
                .entity(id)
                .is_some_and(|foe| foe.health < foe.max_health),
            _ => false,
        };
        if wounded_foe { base + 10 } else { base }
    }
}

/// Prefers movement and discovery.
#[derive(Debug, Clone, Copy, Default)]
pub struct Explorer;

impl DecisionStrategy for Explorer {
    fn name(&self) -> &'static str {
        "explorer"
    }

    fn base_weight(&self, kind: ActionKind) -> i32 {
        match kind {
            ActionKind::Move => 50,
            ActionKind::Search => 45,
            ActionKind::Observe => 35,
            ActionKind::Claim => 30,
            ActionKind::Speak => 20,
            ActionKind::Attack | ActionKind::Rest => 10,
            ActionKind::NoOp => 0,
        }
    }

    fn novelty_bonus(&self) -> i32 {
        25
    }
}

/// Picks the strategy for a role name (case-insensitive).
#[must_use]
pub fn strategy_for_role(role: &str) -> Arc<dyn DecisionStrategy> {
    match role.trim().to_ascii_lowercase().as_str() {
        "warrior" | "guard" => Arc::new(Aggressive),
        "scout" | "rogue" | "explorer" => Arc::new(Explorer),
        _ => Arc::new(Balanced),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roles_map_to_strategies() {
        assert_eq!(strategy_for_role("warrior").name(), "aggressive");
        assert_eq!(strategy_for_role("Guard").name(), "aggressive");
        assert_eq!(strategy_for_role("rogue").name(), "explorer");
        assert_eq!(strategy_for_role("bard").name(), "balanced");
        assert_eq!(strategy_for_role("").name(), "balanced");
    }

    #[test]
    fn test_no_op_is_never_preferred_by_default() {
        for strategy in [strategy_for_role("warrior"), strategy_for_role("scout"), strategy_for_role("")] {
            let lowest = ActionKind::ALL
                .into_iter()
                .map(|k| strategy.base_weight(k))
                .min();
            assert_eq!(lowest, Some(strategy.base_weight(ActionKind::NoOp)));
        }
    }
}
