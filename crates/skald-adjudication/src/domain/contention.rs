//! Exclusive-resource contention detection.

use std::collections::BTreeMap;

use skald_core::action::{Action, ActionKind, Target};
use skald_core::ids::AgentId;
use skald_core::world::{ResourceKey, WorldState};

use super::ruling::Ruling;

/// Several surviving actions that claim the same exclusive resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contention {
    /// The contested resource.
    pub resource: ResourceKey,
    /// The contenders, ordered by agent id.
    pub contenders: Vec<AgentId>,
}

/// The exclusive resource `action` claims, if any.
///
/// A claim takes its resource. A move into a location with a capacity takes
/// that location; only one entity may enter a capped location per turn.
#[must_use]
pub fn claimed_resource(action: &Action, world: &WorldState) -> Option<ResourceKey> {
    match (action.kind, action.target.as_ref()) {
        (ActionKind::Claim, Some(Target::Resource(id))) => Some(ResourceKey::Resource(id.clone())),
        (ActionKind::Move, Some(Target::Location(id))) => world
            .location(id)
            .and_then(|l| l.capacity)
            .map(|_| ResourceKey::Location(id.clone())),
        _ => None,
    }
}

/// Groups committed rulings by claimed resource and returns the groups with
/// more than one member.
#[must_use]
pub fn detect(rulings: &[Ruling], world: &WorldState) -> Vec<Contention> {
    let mut claims: BTreeMap<ResourceKey, Vec<AgentId>> = BTreeMap::new();
    for ruling in rulings.iter().filter(|r| r.verdict.is_committed()) {
        if let Some(key) = claimed_resource(&ruling.action, world) {
            claims.entry(key).or_default().push(ruling.actor().clone());
        }
    }

    claims
        .into_iter()
        .filter(|(_, contenders)| contenders.len() > 1)
        .map(|(resource, mut contenders)| {
            contenders.sort();
            Contention {
                resource,
                contenders,
            }
        })
        .collect()
}
