//! Plain-language beats: one statement per logged proposal.

use skald_core::action::ActionKind;
use skald_core::reason::ReasonCode;
use skald_core::turn::{ProposalRecord, TurnRecord};
use skald_core::verdict::Verdict;

/// What one character did in a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Beat {
    /// Canonical name of the actor.
    pub actor: String,
    /// Predicate without the subject, e.g. "moves to the Crypt".
    pub clause: String,
    /// Whether the actor's verdict was `rejected`.
    pub rejected: bool,
}

impl Beat {
    /// The beat as a full sentence.
    #[must_use]
    pub fn sentence(&self) -> String {
        format!("{} {}.", self.actor, self.clause)
    }
}

/// Beats for every entry of `record`, in log order.
#[must_use]
pub fn beats(record: &TurnRecord) -> Vec<Beat> {
    record
        .entries
        .iter()
        .map(|entry| Beat {
            actor: entry.actor_name.clone(),
            clause: clause(record, entry),
            rejected: entry.verdict.is_rejected(),
        })
        .collect()
}

/// Canonical names every narration of `record` must mention: each actor
/// whose verdict was not `rejected`, once, in log order.
#[must_use]
pub fn required_names(record: &TurnRecord) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for entry in record.entries.iter().filter(|e| !e.verdict.is_rejected()) {
        if !names.contains(&entry.actor_name) {
            names.push(entry.actor_name.clone());
        }
    }
    names
}

fn clause(record: &TurnRecord, entry: &ProposalRecord) -> String {
    let target = entry.target_name.as_deref().unwrap_or("something");
    match &entry.verdict {
        Verdict::Rejected { reason } => {
            format!("tries to {} but cannot ({reason})", infinitive(entry.action.kind, target))
        }
        Verdict::FailedContention { winner, .. } => {
            let winner = record
                .entry_for(winner)
                .map_or_else(|| winner.to_string(), |w| w.actor_name.clone());
            format!("tries to {} but {winner} gets there first", infinitive(entry.action.kind, target))
        }
        Verdict::Adjusted { original, reason } => {
            let meant = if *reason == ReasonCode::TargetVanished {
                "a foe who is gone"
            } else {
                target
            };
            format!(
                "means to {} but instead {}",
                infinitive(*original, meant),
                present(entry.action.kind, target)
            )
        }
        Verdict::Legal => present(entry.action.kind, target),
    }
}

fn present(kind: ActionKind, target: &str) -> String {
    match kind {
        ActionKind::Move => format!("moves to {target}"),
        ActionKind::Attack => format!("attacks {target}"),
        ActionKind::Observe => "looks around".to_owned(),
        ActionKind::Search => "searches the surroundings".to_owned(),
        ActionKind::Claim => format!("claims {target}"),
        ActionKind::Speak => format!("speaks with {target}"),
        ActionKind::Rest => "rests".to_owned(),
        ActionKind::NoOp => "waits".to_owned(),
    }
}

fn infinitive(kind: ActionKind, target: &str) -> String {
    match kind {
        ActionKind::Move => format!("move to {target}"),
        ActionKind::Attack => format!("attack {target}"),
        ActionKind::Observe => "look around".to_owned(),
        ActionKind::Search => "search the surroundings".to_owned(),
        ActionKind::Claim => format!("claim {target}"),
        ActionKind::Speak => format!("speak with {target}"),
        ActionKind::Rest => "rest".to_owned(),
        ActionKind::NoOp => "wait".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skald_core::action::{Action, ProposalOrigin, Target};
    use skald_core::ids::{AgentId, LocationId, ResourceId};
    use skald_core::world::ResourceKey;
    use skald_test_support::idle_turn;

    fn entry(name: &str, action: Action, verdict: Verdict, target: Option<&str>) -> ProposalRecord {
        ProposalRecord {
            actor_name: name.to_owned(),
            action,
            origin: ProposalOrigin::Reasoned,
            verdict,
            target_name: target.map(str::to_owned),
        }
    }

    fn contested() -> TurnRecord {
        let mut record = idle_turn(1, &[]);
        let claim = |actor: &str| {
            Action::new(AgentId::new(actor), ActionKind::Claim, 0)
                .with_target(Target::Resource(ResourceId::new("idol")))
        };
        record.entries = vec![
            entry("Aria", claim("aria"), Verdict::Legal, Some("the Idol")),
            entry(
                "Borin",
                claim("borin"),
                Verdict::FailedContention {
                    resource: ResourceKey::Resource(ResourceId::new("idol")),
                    winner: AgentId::new("aria"),
                },
                Some("the Idol"),
            ),
            entry(
                "Cole",
                Action::new(AgentId::new("cole"), ActionKind::Move, 0)
                    .with_target(Target::Location(LocationId::new("vault"))),
                Verdict::Rejected {
                    reason: ReasonCode::LocationFull,
                },
                Some("the Vault"),
            ),
        ];
        record
    }

    #[test]
    fn test_beats_phrase_each_verdict() {
        let beats = beats(&contested());

        assert_eq!(beats[0].sentence(), "Aria claims the Idol.");
        assert_eq!(
            beats[1].sentence(),
            "Borin tries to claim the Idol but Aria gets there first."
        );
        assert_eq!(
            beats[2].sentence(),
            "Cole tries to move to the Vault but cannot (location_full)."
        );
        assert!(beats[2].rejected);
    }

    #[test]
    fn test_required_names_skip_rejected_actors() {
        assert_eq!(required_names(&contested()), vec!["Aria", "Borin"]);
    }

    #[test]
    fn test_adjusted_attack_reads_as_observation() {
        let mut record = idle_turn(1, &[]);
        record.entries = vec![entry(
            "Aria",
            Action::new(AgentId::new("aria"), ActionKind::Observe, 0),
            Verdict::Adjusted {
                original: ActionKind::Attack,
                reason: ReasonCode::TargetVanished,
            },
            None,
        )];

        assert_eq!(
            beats(&record)[0].sentence(),
            "Aria means to attack a foe who is gone but instead looks around."
        );
    }
}
