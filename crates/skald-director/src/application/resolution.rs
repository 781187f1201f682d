//! Tie-breaking over contested exclusive resources.

use std::cmp::Reverse;

use skald_adjudication::{Adjudication, Ruling};
use skald_core::error::DomainError;
use skald_core::ids::AgentId;
use skald_core::verdict::Verdict;
use tracing::debug;

use crate::domain::registry::AgentRegistry;

/// Picks one winner per contention and marks every other contender as
/// `failed_contention`.
///
/// Higher declared priority wins; ties go to the earlier-registered agent,
/// then to the lexicographically smaller agent id.
///
/// # Errors
///
/// Returns `DomainError::Adjudication` if a contention names an agent that
/// has no ruling.
pub fn resolve(adjudication: Adjudication, registry: &AgentRegistry) -> Result<Vec<Ruling>, DomainError> {
    let Adjudication {
        mut rulings,
        contentions,
    } = adjudication;

    for contention in contentions {
        let mut ranked = Vec::with_capacity(contention.contenders.len());
        for contender in &contention.contenders {
            let ruling = rulings
                .iter()
                .find(|r| r.actor() == contender)
                .ok_or_else(|| {
                    DomainError::Adjudication(format!(
                        "contention over {} names `{contender}`, who has no ruling",
                        contention.resource
                    ))
                })?;
            let rank = registry.position(contender).unwrap_or(usize::MAX);
            ranked.push((Reverse(ruling.action.priority), rank, contender.clone()));
        }
        ranked.sort();
        let Some((_, _, winner)) = ranked.first().cloned() else {
            continue;
        };

        debug!(
            resource = %contention.resource,
            winner = %winner,
            contenders = ranked.len(),
            "resolved contention"
        );
        for ruling in rulings
            .iter_mut()
            .filter(|r| r.actor() != &winner && contention.contenders.contains(r.actor()))
        {
            ruling.verdict = Verdict::FailedContention {
                resource: contention.resource.clone(),
                winner: AgentId::clone(&winner),
            };
        }
    }
    Ok(rulings)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use skald_adjudication::Contention;
    use skald_core::action::{Action, ActionKind, Proposal, Target};
    use skald_core::ids::ResourceId;
    use skald_core::world::ResourceKey;
    use skald_persona::{Agent, CharacterProfile, DecisionEngine, EngineConfig};

    fn registry(order: &[&str]) -> AgentRegistry {
        let mut registry = AgentRegistry::new();
        for id in order {
            let profile = CharacterProfile::from_json_str(&format!(
                r#"{{"id": "{id}", "name": "{id}", "allowed_actions": ["claim"]}}"#
            ))
            .unwrap();
            registry
                .register(
                    Agent::new(profile, Arc::new(DecisionEngine::new(EngineConfig::default())), 4)
                        .unwrap(),
                )
                .unwrap();
        }
        registry
    }

    fn idol() -> ResourceKey {
        ResourceKey::Resource(ResourceId::new("idol"))
    }

    fn contest(claims: &[(&str, i32)]) -> Adjudication {
        let rulings = claims
            .iter()
            .map(|(actor, priority)| {
                let action = Action::new(AgentId::new(*actor), ActionKind::Claim, *priority)
                    .with_target(Target::Resource(ResourceId::new("idol")));
                Ruling {
                    proposal: Proposal::reasoned(action.clone()),
                    action,
                    verdict: Verdict::Legal,
                }
            })
            .collect();
        let mut contenders: Vec<AgentId> = claims.iter().map(|(a, _)| AgentId::new(*a)).collect();
        contenders.sort();
        Adjudication {
            rulings,
            contentions: vec![Contention {
                resource: idol(),
                contenders,
            }],
        }
    }

    fn winner(rulings: &[Ruling]) -> Vec<&str> {
        rulings
            .iter()
            .filter(|r| r.verdict == Verdict::Legal)
            .map(|r| r.actor().as_str())
            .collect()
    }

    #[test]
    fn test_higher_priority_wins() {
        let rulings = resolve(contest(&[("aria", 1), ("borin", 5)]), &registry(&["aria", "borin"])).unwrap();

        assert_eq!(winner(&rulings), vec!["borin"]);
        assert_eq!(
            rulings[0].verdict,
            Verdict::FailedContention {
                resource: idol(),
                winner: AgentId::new("borin")
            }
        );
    }

    #[test]
    fn test_equal_priority_goes_to_earlier_registration() {
        let rulings = resolve(contest(&[("aria", 3), ("borin", 3)]), &registry(&["borin", "aria"])).unwrap();

        assert_eq!(winner(&rulings), vec!["borin"]);
    }

    #[test]
    fn test_unregistered_contenders_fall_back_to_agent_id() {
        let rulings = resolve(contest(&[("zed", 0), ("yan", 0)]), &AgentRegistry::new()).unwrap();

        assert_eq!(winner(&rulings), vec!["yan"]);
    }

    #[test]
    fn test_result_does_not_depend_on_ruling_order() {
        let forward = resolve(contest(&[("aria", 2), ("borin", 2), ("cole", 2)]), &registry(&["cole", "aria", "borin"])).unwrap();
        let backward = resolve(contest(&[("cole", 2), ("borin", 2), ("aria", 2)]), &registry(&["cole", "aria", "borin"])).unwrap();

        assert_eq!(winner(&forward), vec!["cole"]);
        assert_eq!(winner(&backward), vec!["cole"]);
    }
}
