//! Deterministic narration, one layout per style.
//!
//! Every layout names each actor of the turn, so a templated segment always
//! satisfies the naming requirement.

use skald_core::service::NarrativeStyle;
use skald_core::turn::TurnRecord;

use super::beat::{Beat, beats};

/// Renders `record` in `style`.
#[must_use]
pub fn render(record: &TurnRecord, style: NarrativeStyle) -> String {
    let beats = beats(record);
    match style {
        NarrativeStyle::Terse => terse(&beats),
        NarrativeStyle::Epic => epic(record, &beats),
        NarrativeStyle::Journal => journal(record, &beats),
    }
}

fn terse(beats: &[Beat]) -> String {
    if beats.is_empty() {
        return "Nothing happens.".to_owned();
    }
    beats.iter().map(Beat::sentence).collect::<Vec<_>>().join("\n")
}

fn epic(record: &TurnRecord, beats: &[Beat]) -> String {
    let opening = format!("In the {} turn of the tale", ordinal(record.turn.get()));
    let deeds: Vec<String> = beats
        .iter()
        .map(|beat| format!("{} {}", beat.actor, beat.clause))
        .collect();
    match deeds.as_slice() {
        [] => format!("{opening}, all lay still."),
        [only] => format!("{opening}, {only}."),
        [init @ .., last] => format!("{opening}, {}, and {last}.", init.join(", while ")),
    }
}

fn journal(record: &TurnRecord, beats: &[Beat]) -> String {
    let mut lines = vec![format!(
        "Turn {} ({})",
        record.turn,
        record.committed_at.format("%Y-%m-%d")
    )];
    if beats.is_empty() {
        lines.push("- No entries.".to_owned());
    }
    lines.extend(beats.iter().map(|beat| format!("- {}", beat.sentence())));
    lines.join("\n")
}

/// English ordinal for `n`, spelled out up to twelve.
#[must_use]
pub fn ordinal(n: u64) -> String {
    const WORDS: [&str; 12] = [
        "first", "second", "third", "fourth", "fifth", "sixth", "seventh", "eighth", "ninth",
        "tenth", "eleventh", "twelfth",
    ];
    if let Some(word) = usize::try_from(n)
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| WORDS.get(i))
    {
        return (*word).to_owned();
    }
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}
