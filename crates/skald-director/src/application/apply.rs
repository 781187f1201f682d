//! Turning committed actions into world deltas.

use skald_core::action::{Action, ActionKind, Target};
use skald_core::error::DomainError;
use skald_core::ids::{EntityId, LocationId};
use skald_core::world::{Entity, EntityStatus, WorldDelta, WorldState};

/// Applies one committed action to `world` and returns the deltas it
/// produced, in the order they were applied.
///
/// Each delta lands before the next is computed, so an action sees the
/// effects of the actions applied before it in the same turn.
///
/// # Errors
///
/// Returns `DomainError::Integrity` if the action references something the
/// world does not contain or lacks a target it needs.
pub fn apply_action(
    world: &mut WorldState,
    action: &Action,
    might: i32,
) -> Result<Vec<WorldDelta>, DomainError> {
    let actor = actor(world, &action.actor)?;
    let mut deltas = Vec::new();

    match (action.kind, action.target.as_ref()) {
        (ActionKind::Move, Some(Target::Location(to))) => {
            let from = actor.location.clone();
            push(world, &mut deltas, WorldDelta::Moved {
                entity: action.actor.clone(),
                from,
                to: to.clone(),
            })?;
            let revealed = reveal(world, &action.actor, to);
            push(world, &mut deltas, revealed)?;
        }
        (ActionKind::Attack, Some(Target::Entity(victim))) => {
            let victim = world
                .entity(victim)
                .ok_or_else(|| DomainError::Integrity(format!("unknown entity `{victim}`")))?;
            let amount = might.max(0);
            let health = victim.health.saturating_sub(amount);
            let delta = WorldDelta::Damaged {
                entity: victim.id.clone(),
                by: action.actor.clone(),
                amount,
                health,
                status: if health > 0 {
                    EntityStatus::Active
                } else {
                    EntityStatus::Downed
                },
            };
            push(world, &mut deltas, delta)?;
        }
        (ActionKind::Observe, _) => {
            let location = actor.location.clone();
            let revealed = reveal(world, &action.actor, &location);
            push(world, &mut deltas, revealed)?;
        }
        (ActionKind::Search, _) => {
            let found: Vec<_> = world
                .undiscovered_facts_at(&actor.location, &action.actor)
                .map(|fact| fact.id.clone())
                .collect();
            for fact in found {
                push(world, &mut deltas, WorldDelta::FactDiscovered {
                    fact,
                    by: action.actor.clone(),
                })?;
            }
        }
        (ActionKind::Claim, Some(Target::Resource(resource))) => {
            push(world, &mut deltas, WorldDelta::Claimed {
                resource: resource.clone(),
                holder: action.actor.clone(),
            })?;
        }
        (ActionKind::Speak, Some(Target::Entity(listener))) => {
            push(world, &mut deltas, WorldDelta::Spoke {
                speaker: action.actor.clone(),
                listener: listener.clone(),
            })?;
        }
        (ActionKind::Rest, _) => {
            if actor.health < actor.max_health {
                let health = actor.health + 1;
                push(world, &mut deltas, WorldDelta::Healed {
                    entity: action.actor.clone(),
                    health,
                })?;
            }
        }
        (ActionKind::NoOp, _) => {}
        (kind, target) => {
            return Err(DomainError::Integrity(format!(
                "committed {kind} by `{}` has an unusable target {target:?}",
                action.actor
            )));
        }
    }
    Ok(deltas)
}

fn actor(world: &WorldState, id: &EntityId) -> Result<Entity, DomainError> {
    world
        .entity(id)
        .cloned()
        .ok_or_else(|| DomainError::Integrity(format!("unknown entity `{id}`")))
}

fn reveal(world: &WorldState, observer: &EntityId, location: &LocationId) -> WorldDelta {
    WorldDelta::Revealed {
        observer: observer.clone(),
        location: location.clone(),
        visible: world
            .entities_at(location)
            .filter(|e| &e.id != observer)
            .map(|e| e.id.clone())
            .collect(),
    }
}

fn push(world: &mut WorldState, deltas: &mut Vec<WorldDelta>, delta: WorldDelta) -> Result<(), DomainError> {
    world.apply_delta(&delta)?;
    deltas.push(delta);
    Ok(())
}
