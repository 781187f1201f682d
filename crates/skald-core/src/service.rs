//! Contracts for the external reasoning and prose-generation services.
//!
//! Both services are slow and unreliable by nature. Callers bound every call
//! with a timeout and treat any [`ServiceError`] as a signal to fall back to
//! deterministic behavior.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::action::{ActionKind, Target};
use crate::ids::{AgentId, TurnNumber};
use crate::reason::ReasonCode;

/// Failure modes of an external service call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServiceError {
    /// The call did not complete in time.
    #[error("service call timed out")]
    Timeout,
    /// The response could not be interpreted.
    #[error("malformed service response: {0}")]
    Malformed(String),
    /// The service refused the call because of rate limiting.
    #[error("service rate limited the request")]
    RateLimited,
    /// The service could not be reached or failed.
    #[error("service unavailable: {0}")]
    Unavailable(String),
}

impl ServiceError {
    /// Returns the reason code recorded when a decision falls back because of
    /// this error.
    #[must_use]
    pub fn reason_code(&self) -> ReasonCode {
        match self {
            Self::Timeout => ReasonCode::ServiceTimeout,
            Self::Malformed(_) => ReasonCode::MalformedResponse,
            Self::RateLimited => ReasonCode::RateLimited,
            Self::Unavailable(_) => ReasonCode::ServiceUnavailable,
        }
    }
}

/// One action offered to the reasoning service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateOption {
    /// The label the service must echo back to choose this option.
    pub label: String,
    /// The action kind.
    pub kind: ActionKind,
    /// The target, if any.
    pub target: Option<Target>,
    /// The default score the fallback would use.
    pub score: i32,
}

/// A request to choose among candidate actions.
#[derive(Debug, Clone, Serialize)]
pub struct ReasoningRequest {
    /// The deciding agent.
    pub agent_id: AgentId,
    /// The current turn.
    pub turn: TurnNumber,
    /// A plain-text description of the situation and recent history.
    pub context: String,
    /// The character profile as a JSON document.
    pub character_profile: serde_json::Value,
    /// The actions the agent may choose from.
    pub allowed_actions: Vec<CandidateOption>,
}

/// The reasoning service's choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReasoningResponse {
    /// The label of the chosen candidate.
    pub chosen_action: String,
    /// Why the character chose it.
    pub rationale_text: String,
}

/// An external reasoning service (typically an LLM).
#[async_trait]
pub trait ReasoningService: Send + Sync {
    /// Chooses one of `request.allowed_actions`.
    ///
    /// # Errors
    ///
    /// Returns a [`ServiceError`] describing why no choice was made.
    async fn choose(&self, request: &ReasoningRequest) -> Result<ReasoningResponse, ServiceError>;
}

/// The narrative styles the Chronicler can write in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NarrativeStyle {
    /// One short sentence per action.
    #[default]
    Terse,
    /// A flowing, elevated paragraph.
    Epic,
    /// A dated log-book entry with one bullet per character.
    Journal,
}

impl NarrativeStyle {
    /// Every style.
    pub const ALL: [Self; 3] = [Self::Terse, Self::Epic, Self::Journal];

    /// Returns the style name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Terse => "terse",
            Self::Epic => "epic",
            Self::Journal => "journal",
        }
    }

    /// Returns the writing instruction handed to a prose generator.
    #[must_use]
    pub fn guidance(self) -> &'static str {
        match self {
            Self::Terse => "Write one short, plain sentence per character. No embellishment.",
            Self::Epic => {
                "Write a single flowing paragraph in the elevated voice of a saga, \
                 naming every character."
            }
            Self::Journal => {
                "Write a log-book entry headed with the turn number, then one bullet \
                 line per character."
            }
        }
    }
}

impl fmt::Display for NarrativeStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NarrativeStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|style| style.as_str() == normalized)
            .ok_or_else(|| format!("unknown narrative style `{s}`"))
    }
}

/// A request to narrate one turn.
#[derive(Debug, Clone, Serialize)]
pub struct ProseRequest {
    /// The turn being narrated.
    pub turn: TurnNumber,
    /// The requested style.
    pub style: NarrativeStyle,
    /// Canonical names that must appear in the text.
    pub characters: Vec<String>,
    /// Plain statements of what happened, one per action.
    pub beats: Vec<String>,
}

/// An external prose generator (typically an LLM).
#[async_trait]
pub trait ProseGenerator: Send + Sync {
    /// Writes narrative text for one turn.
    ///
    /// # Errors
    ///
    /// Returns a [`ServiceError`] if no text could be produced.
    async fn generate(&self, request: &ProseRequest) -> Result<String, ServiceError>;
}
