//! Character profiles.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use skald_core::action::ActionKind;
use skald_core::error::DomainError;
use skald_core::ids::AgentId;

/// Damage dealt by an attacker whose profile has no `might` trait.
pub const DEFAULT_MIGHT: i32 = 1;

/// Largest `might` a profile may declare.
pub const MAX_MIGHT: i32 = 100;

/// The document formats a profile can be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileFormat {
    /// YAML.
    Yaml,
    /// JSON.
    Json,
}

impl fmt::Display for ProfileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Yaml => "yaml",
            Self::Json => "json",
        })
    }
}

impl FromStr for ProfileFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown profile format `{other}`")),
        }
    }
}

/// The static description of a character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterProfile {
    /// Agent id; must match the character's entity in the world.
    pub id: AgentId,
    /// Canonical name used in narration.
    pub name: String,
    /// Role, which selects the decision strategy.
    #[serde(default)]
    pub role: String,
    /// Action kinds the character may propose. `no_op` is always allowed.
    pub allowed_actions: Vec<ActionKind>,
    /// Numeric traits such as `might`.
    #[serde(default)]
    pub traits: BTreeMap<String, i32>,
    /// Carried equipment, for flavour and reasoning context.
    #[serde(default)]
    pub equipment: Vec<String>,
    /// Declared priority of every action this character proposes.
    #[serde(default)]
    pub initiative: i32,
    /// Per-kind weight overrides for the role strategy.
    #[serde(default)]
    pub weights: BTreeMap<ActionKind, i32>,
    /// Decision history size; the Director default applies when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history_capacity: Option<usize>,
}

impl CharacterProfile {
    /// Parses a profile document.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::MalformedProfile` if the document does not parse
    /// or fails [`CharacterProfile::validate`].
    pub fn parse(document: &str, format: ProfileFormat) -> Result<Self, DomainError> {
        let parsed: Result<Self, String> = match format {
            ProfileFormat::Yaml => serde_yaml::from_str(document).map_err(|e| e.to_string()),
            ProfileFormat::Json => serde_json::from_str(document).map_err(|e| e.to_string()),
        };
        let profile = parsed.map_err(|reason| DomainError::MalformedProfile {
            profile: format!("<{format} document>"),
            reason,
        })?;
        profile.validate()?;
        Ok(profile)
    }

    /// Parses a YAML profile.
    ///
    /// # Errors
    ///
    /// See [`CharacterProfile::parse`].
    pub fn from_yaml_str(document: &str) -> Result<Self, DomainError> {
        Self::parse(document, ProfileFormat::Yaml)
    }

    /// Parses a JSON profile.
    ///
    /// # Errors
    ///
    /// See [`CharacterProfile::parse`].
    pub fn from_json_str(document: &str) -> Result<Self, DomainError> {
        Self::parse(document, ProfileFormat::Json)
    }

    /// Checks the profile for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::MalformedProfile` naming the first problem.
    pub fn validate(&self) -> Result<(), DomainError> {
        let malformed = |reason: String| DomainError::MalformedProfile {
            profile: if self.id.as_str().is_empty() {
                "<unnamed>".to_owned()
            } else {
                self.id.to_string()
            },
            reason,
        };

        if self.id.as_str().trim().is_empty() {
            return Err(malformed("id must not be empty".into()));
        }
        if self.name.trim().is_empty() {
            return Err(malformed("name must not be empty".into()));
        }
        if self.allowed_actions.is_empty() {
            return Err(malformed("at least one allowed action is required".into()));
        }
        let mut seen = BTreeSet::new();
        if let Some(duplicate) = self.allowed_actions.iter().find(|k| !seen.insert(**k)) {
            return Err(malformed(format!("allowed action `{duplicate}` listed twice")));
        }
        if let Some(kind) = self.weights.keys().find(|k| !self.allows(**k)) {
            return Err(malformed(format!(
                "weight given for `{kind}`, which is not an allowed action"
            )));
        }
        if self.history_capacity == Some(0) {
            return Err(malformed("history capacity must be at least 1".into()));
        }
        let might = self.might();
        if !(0..=MAX_MIGHT).contains(&might) {
            return Err(malformed(format!("might {might} is outside 0..={MAX_MIGHT}")));
        }
        Ok(())
    }

    /// Whether the character may propose `kind`.
    #[must_use]
    pub fn allows(&self, kind: ActionKind) -> bool {
        kind == ActionKind::NoOp || self.allowed_actions.contains(&kind)
    }

    /// Looks up a trait value.
    #[must_use]
    pub fn trait_value(&self, name: &str) -> Option<i32> {
        self.traits.get(name).copied()
    }

    /// Damage dealt by this character's attacks.
    #[must_use]
    pub fn might(&self) -> i32 {
        self.trait_value("might").unwrap_or(DEFAULT_MIGHT)
    }
}
