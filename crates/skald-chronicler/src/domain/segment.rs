//! Narrative segments.

use serde::Serialize;
use skald_core::ids::TurnNumber;
use skald_core::reason::ReasonCode;
use skald_core::service::NarrativeStyle;

/// Where a segment's text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum SegmentSource {
    /// Written by the prose generator.
    Generated,
    /// Rendered from the deterministic template.
    Templated {
        /// Why the generator's text was not used.
        reason: ReasonCode,
    },
}

impl SegmentSource {
    /// The fallback reason, if the segment was templated.
    #[must_use]
    pub fn reason(self) -> Option<ReasonCode> {
        match self {
            Self::Generated => None,
            Self::Templated { reason } => Some(reason),
        }
    }
}

/// Prose for a span of turns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NarrativeSegment {
    /// First turn narrated.
    pub first_turn: TurnNumber,
    /// Last turn narrated.
    pub last_turn: TurnNumber,
    /// Style the text is written in.
    pub style: NarrativeStyle,
    /// Canonical names of the characters the text references.
    pub characters: Vec<String>,
    /// The prose.
    pub text: String,
    /// Generated or templated.
    #[serde(flatten)]
    pub source: SegmentSource,
}

impl NarrativeSegment {
    /// Whether the text mentions every name in `characters`.
    #[must_use]
    pub fn names_everyone(&self) -> bool {
        self.characters.iter().all(|name| mentions(&self.text, name))
    }
}

/// Whether `text` contains `name` as a whole word: `Al` does not count as
/// a mention inside `Alice`.
#[must_use]
pub fn mentions(text: &str, name: &str) -> bool {
    if name.is_empty() {
        return true;
    }
    text.match_indices(name).any(|(start, _)| {
        let before = text[..start].chars().next_back();
        let after = text[start + name.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_serializes_source_inline() {
        let segment = NarrativeSegment {
            first_turn: TurnNumber::FIRST,
            last_turn: TurnNumber::FIRST,
            style: NarrativeStyle::Terse,
            characters: vec!["Aria".into()],
            text: "Aria waits.".into(),
            source: SegmentSource::Templated {
                reason: ReasonCode::NoGenerator,
            },
        };

        let json = serde_json::to_value(&segment).unwrap();

        assert_eq!(json["source"], "templated");
        assert_eq!(json["reason"], "no_generator");
        assert_eq!(json["style"], "terse");
        assert!(segment.names_everyone());
    }

    #[test]
    fn test_mentions_need_whole_words() {
        assert!(mentions("Al waits.", "Al"));
        assert!(mentions("\"Al!\" Borin calls.", "Al"));
        assert!(mentions("Alice and Al wait.", "Al"));
        assert!(mentions("the Ghoul lurches.", "the Ghoul"));
        assert!(!mentions("Alice waits.", "Al"));
        assert!(!mentions("Hal waits.", "Al"));
    }
}
