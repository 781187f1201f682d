//! Plain-text situation summaries handed to the reasoning service.

use std::fmt::Write;

use crate::domain::candidate::Situation;

/// Describes where the character is, who and what is around, and what it
/// did recently.
#[must_use]
pub fn describe(situation: &Situation<'_>) -> String {
    let Situation {
        profile,
        world,
        me,
        history,
    } = *situation;
    let mut text = String::new();

    let place = world
        .location(&me.location)
        .map_or(me.location.as_str(), |l| l.name.as_str());
    let _ = writeln!(
        text,
        "You are {}, a {}. You stand in {place} with {}/{} health.",
        profile.name,
        if profile.role.is_empty() { "wanderer" } else { profile.role.as_str() },
        me.health,
        me.max_health
    );

    let company: Vec<&str> = world
        .entities_at(&me.location)
        .filter(|e| e.id != me.id)
        .map(|e| e.name.as_str())
        .collect();
    if !company.is_empty() {
        let _ = writeln!(text, "Also here: {}.", company.join(", "));
    }

    let loot: Vec<&str> = world
        .free_resources_at(&me.location)
        .map(|r| r.name.as_str())
        .collect();
    if !loot.is_empty() {
        let _ = writeln!(text, "Unclaimed: {}.", loot.join(", "));
    }

    if !profile.equipment.is_empty() {
        let _ = writeln!(text, "You carry: {}.", profile.equipment.join(", "));
    }

    if !history.is_empty() {
        text.push_str("Recently:\n");
        for experience in history.iter().rev().take(5) {
            let target = experience
                .target
                .as_ref()
                .map(|t| format!(" {}", t.id_str()))
                .unwrap_or_default();
            let _ = writeln!(
                text,
                "- turn {}: {}{target} ({})",
                experience.turn,
                experience.kind,
                experience.verdict.tag()
            );
        }
    }
    text
}
