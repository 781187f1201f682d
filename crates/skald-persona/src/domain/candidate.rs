//! Candidate actions and their ranking.

use std::cmp::Reverse;

use skald_core::action::{Action, ActionKind, Target};
use skald_core::ids::{AgentId, LocationId};
use skald_core::service::CandidateOption;
use skald_core::world::{Entity, EntityStatus, WorldState};

use super::history::Experience;
use super::profile::CharacterProfile;
use super::strategy::DecisionStrategy;

/// What a character can see while deciding.
#[derive(Debug, Clone, Copy)]
pub struct Situation<'a> {
    /// The deciding character.
    pub profile: &'a CharacterProfile,
    /// The start-of-turn snapshot.
    pub world: &'a WorldState,
    /// The character's own entity.
    pub me: &'a Entity,
    /// Recent experiences, oldest first.
    pub history: &'a [Experience],
}

impl Situation<'_> {
    /// Whether the character moved to `location` within its remembered
    /// history, or is standing there now.
    #[must_use]
    pub fn recently_visited(&self, location: &LocationId) -> bool {
        &self.me.location == location
            || self.history.iter().any(|e| {
                e.kind == ActionKind::Move
                    && e.was_committed()
                    && matches!(&e.target, Some(Target::Location(l)) if l == location)
            })
    }

    /// Kind of the most recent remembered action.
    #[must_use]
    pub fn last_kind(&self) -> Option<ActionKind> {
        self.history.last().map(|e| e.kind)
    }
}

/// A concrete action with its score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// The action kind.
    pub kind: ActionKind,
    /// Its target.
    pub target: Option<Target>,
    /// Strategy score; higher is preferred.
    pub score: i32,
}

impl Candidate {
    /// The label offered to a reasoning service, e.g. `move:vault`.
    #[must_use]
    pub fn label(&self) -> String {
        match &self.target {
            Some(target) => format!("{}:{}", self.kind, target.id_str()),
            None => self.kind.as_str().to_owned(),
        }
    }

    /// Turns the candidate into an action for `actor`.
    #[must_use]
    pub fn to_action(&self, actor: &AgentId, priority: i32) -> Action {
        let action = Action::new(actor.clone(), self.kind, priority);
        match &self.target {
            Some(target) => action.with_target(target.clone()),
            None => action,
        }
    }

    /// The wire form offered to a reasoning service.
    #[must_use]
    pub fn to_option(&self) -> CandidateOption {
        CandidateOption {
            label: self.label(),
            kind: self.kind,
            target: self.target.clone(),
            score: self.score,
        }
    }
}

/// Lists every concrete action the character could attempt, unscored.
///
/// A downed character can only rest or do nothing. Moves into a location
/// with no room left are not offered. `no_op` is always present, so the
/// list is never empty.
#[must_use]
pub fn options(situation: &Situation<'_>) -> Vec<(ActionKind, Option<Target>)> {
    let Situation {
        profile, world, me, ..
    } = *situation;
    let downed = me.status == EntityStatus::Downed;
    let others: Vec<&Entity> = world
        .entities_at(&me.location)
        .filter(|e| e.id != me.id && e.status == EntityStatus::Active)
        .collect();

    let mut options = Vec::new();
    for kind in ActionKind::ALL {
        if !profile.allows(kind) || (downed && !matches!(kind, ActionKind::Rest | ActionKind::NoOp)) {
            continue;
        }
        match kind {
            ActionKind::Move => {
                if let Some(here) = world.location(&me.location) {
                    options.extend(
                        here.exits
                            .iter()
                            .filter(|exit| world.has_room(exit))
                            .map(|exit| (kind, Some(Target::Location(exit.clone())))),
                    );
                }
            }
            ActionKind::Attack | ActionKind::Speak => {
                options.extend(
                    others
                        .iter()
                        .map(|e| (kind, Some(Target::Entity(e.id.clone())))),
                );
            }
            ActionKind::Claim => {
                options.extend(
                    world
                        .free_resources_at(&me.location)
                        .map(|r| (kind, Some(Target::Resource(r.id.clone())))),
                );
            }
            ActionKind::Observe | ActionKind::Search | ActionKind::Rest | ActionKind::NoOp => {
                options.push((kind, None));
            }
        }
    }
    options
}

/// Scores and orders the character's options: by score descending, then
/// kind, then target id.
#[must_use]
pub fn rank(strategy: &dyn DecisionStrategy, situation: &Situation<'_>) -> Vec<Candidate> {
    let mut candidates: Vec<Candidate> = options(situation)
        .into_iter()
        .map(|(kind, target)| {
            let base = situation
                .profile
                .weights
                .get(&kind)
                .copied()
                .unwrap_or_else(|| strategy.base_weight(kind));
            let score = base + strategy.adjustment(kind, target.as_ref(), situation);
            Candidate {
                kind,
                target,
                score,
            }
        })
        .collect();

    candidates.sort_by(|a, b| {
        (Reverse(a.score), a.kind, a.target.as_ref().map(Target::id_str)).cmp(&(
            Reverse(b.score),
            b.kind,
            b.target.as_ref().map(Target::id_str),
        ))
    });
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::strategy::{Balanced, Explorer, strategy_for_role};
    use skald_core::ids::EntityId;
    use skald_core::verdict::Verdict;
    use skald_test_support::WorldBuilder;

    fn profile(role: &str, allowed: &[ActionKind]) -> CharacterProfile {
        CharacterProfile {
            id: AgentId::new("aria"),
            name: "Aria".into(),
            role: role.into(),
            allowed_actions: allowed.to_vec(),
            traits: std::collections::BTreeMap::new(),
            equipment: Vec::new(),
            initiative: 0,
            weights: std::collections::BTreeMap::new(),
            history_capacity: None,
        }
    }

    fn world() -> WorldState {
        WorldBuilder::new()
            .location("hall", None)
            .location("vault", Some(1))
            .location("garden", None)
            .connect("hall", "vault")
            .connect("hall", "garden")
            .entity("aria", "Aria", "hall")
            .entity("borin", "Borin", "hall")
            .resource("idol", "hall")
            .build()
    }

    #[test]
    fn test_options_respect_allowed_kinds_and_surroundings() {
        let world = world();
        let profile = profile("", &[ActionKind::Move, ActionKind::Claim, ActionKind::Speak]);
        let me = world.entity(&EntityId::new("aria")).unwrap();
        let situation = Situation {
            profile: &profile,
            world: &world,
            me,
            history: &[],
        };

        let labels: Vec<String> = options(&situation)
            .into_iter()
            .map(|(kind, target)| Candidate { kind, target, score: 0 }.label())
            .collect();

        assert_eq!(
            labels,
            vec!["move:garden", "move:vault", "claim:idol", "speak:borin", "no_op"]
        );
    }

    #[test]
    fn test_full_location_is_never_offered() {
        // Arrange
        let world = WorldBuilder::new()
            .location("hall", None)
            .location("vault", Some(1))
            .location("garden", None)
            .connect("hall", "vault")
            .connect("hall", "garden")
            .entity("aria", "Aria", "hall")
            .entity("cole", "Cole", "vault")
            .build();
        let profile = profile("scout", &[ActionKind::Move]);
        let me = world.entity(&EntityId::new("aria")).unwrap();
        let situation = Situation {
            profile: &profile,
            world: &world,
            me,
            history: &[],
        };

        // Act
        let ranked = rank(&Explorer, &situation);

        // Assert
        let labels: Vec<String> = ranked.iter().map(Candidate::label).collect();
        assert_eq!(labels, vec!["move:garden", "no_op"]);
    }

    #[test]
    fn test_downed_character_may_only_rest() {
        let world = WorldBuilder::new()
            .location("hall", None)
            .wounded_entity("aria", "Aria", "hall", 0)
            .entity("borin", "Borin", "hall")
            .build();
        let profile = profile("warrior", &[ActionKind::Attack, ActionKind::Rest]);
        let me = world.entity(&EntityId::new("aria")).unwrap();
        let situation = Situation {
            profile: &profile,
            world: &world,
            me,
            history: &[],
        };

        let ranked = rank(&*strategy_for_role("warrior"), &situation);

        assert_eq!(ranked[0].kind, ActionKind::Rest);
        assert_eq!(ranked.len(), 2);
    }

    #[test]
    fn test_explorer_prefers_unvisited_location() {
        let world = world();
        let profile = profile("scout", &[ActionKind::Move, ActionKind::Observe]);
        let me = world.entity(&EntityId::new("aria")).unwrap();
        let history = [Experience {
            turn: skald_core::ids::TurnNumber::new(1),
            kind: ActionKind::Move,
            target: Some(Target::Location(LocationId::new("garden"))),
            verdict: Verdict::Legal,
        }];
        let situation = Situation {
            profile: &profile,
            world: &world,
            me,
            history: &history,
        };

        let ranked = rank(&Explorer, &situation);

        assert_eq!(ranked[0].label(), "move:vault");
        assert!(ranked[0].score > ranked[1].score);
    }

    #[test]
    fn test_profile_weights_override_strategy() {
        let world = world();
        let mut profile = profile("", &[ActionKind::Move, ActionKind::Observe]);
        profile.weights.insert(ActionKind::Observe, 500);
        let me = world.entity(&EntityId::new("aria")).unwrap();
        let situation = Situation {
            profile: &profile,
            world: &world,
            me,
            history: &[],
        };

        let ranked = rank(&Balanced, &situation);

        assert_eq!(ranked[0].kind, ActionKind::Observe);
    }

    #[test]
    fn test_equal_scores_order_by_kind_then_target() {
        let world = world();
        let mut profile = profile("", &[ActionKind::Move]);
        profile.weights.insert(ActionKind::Move, 0);
        let me = world.entity(&EntityId::new("aria")).unwrap();
        let situation = Situation {
            profile: &profile,
            world: &world,
            me,
            history: &[],
        };

        // garden and vault both unvisited; vault is capped but has room.
        let ranked = rank(&Balanced, &situation);

        assert_eq!(ranked[0].label(), "move:garden");
        assert_eq!(ranked[1].label(), "move:vault");
        assert_eq!(ranked[2].label(), "no_op");
    }
}
