//! The transcription engine.

use std::sync::Arc;
use std::time::Duration;

use skald_core::env::{self, Lookup, ProcessEnv};
use skald_core::error::DomainError;
use skald_core::reason::ReasonCode;
use skald_core::service::{NarrativeStyle, ProseGenerator, ProseRequest};
use skald_core::turn::TurnRecord;
use tracing::{debug, instrument, warn};

use crate::domain::beat::{Beat, beats, required_names};
use crate::domain::segment::{NarrativeSegment, SegmentSource, mentions};
use crate::domain::template;

/// Tuning for the Chronicler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChroniclerConfig {
    /// How long to wait for the prose generator per turn.
    pub generation_timeout: Duration,
}

impl Default for ChroniclerConfig {
    fn default() -> Self {
        Self {
            generation_timeout: Duration::from_secs(5),
        }
    }
}

impl ChroniclerConfig {
    /// Reads `SKALD_PROSE_TIMEOUT_MS` from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the value is not a number.
    pub fn from_env() -> Result<Self, DomainError> {
        Self::from_lookup(&ProcessEnv)
    }

    /// Reads configuration through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if a value does not parse.
    pub fn from_lookup(lookup: &impl Lookup) -> Result<Self, DomainError> {
        Ok(Self {
            generation_timeout: env::millis(
                lookup,
                "SKALD_PROSE_TIMEOUT_MS",
                Self::default().generation_timeout,
            )?,
        })
    }
}

/// Renders turn records as narrative segments. Never fails: every problem
/// with the prose generator degrades to the template.
#[derive(Default)]
pub struct Chronicler {
    config: ChroniclerConfig,
    generator: Option<Arc<dyn ProseGenerator>>,
}

impl std::fmt::Debug for Chronicler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chronicler")
            .field("config", &self.config)
            .field("generator", &self.generator.is_some())
            .finish()
    }
}

impl Chronicler {
    /// A template-only Chronicler.
    #[must_use]
    pub fn new(config: ChroniclerConfig) -> Self {
        Self {
            config,
            generator: None,
        }
    }

    /// Uses `generator` for prose.
    #[must_use]
    pub fn with_generator(mut self, generator: Arc<dyn ProseGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Narrates each record, one segment per record, in iteration order.
    #[instrument(skip_all, fields(style = %style))]
    pub async fn transcribe<'a, I>(
        &self,
        records: I,
        style: NarrativeStyle,
    ) -> Vec<NarrativeSegment>
    where
        I: IntoIterator<Item = &'a TurnRecord>,
    {
        let mut segments = Vec::new();
        for record in records {
            segments.push(self.narrate(record, style).await);
        }
        debug!(segments = segments.len(), "transcribed campaign log");
        segments
    }

    /// Narrates a single turn.
    pub async fn narrate(&self, record: &TurnRecord, style: NarrativeStyle) -> NarrativeSegment {
        let characters = required_names(record);
        let generated = match &self.generator {
            None => Err(ReasonCode::NoGenerator),
            Some(generator) => {
                self.generate(generator.as_ref(), record, style, &characters)
                    .await
            }
        };
        let (text, source) = match generated {
            Ok(text) => (text, SegmentSource::Generated),
            Err(reason) => {
                if reason != ReasonCode::NoGenerator {
                    warn!(turn = %record.turn, %reason, "narrating turn from template");
                }
                (
                    template::render(record, style),
                    SegmentSource::Templated { reason },
                )
            }
        };

        NarrativeSegment {
            first_turn: record.turn,
            last_turn: record.turn,
            style,
            characters,
            text,
            source,
        }
    }

    async fn generate(
        &self,
        generator: &dyn ProseGenerator,
        record: &TurnRecord,
        style: NarrativeStyle,
        characters: &[String],
    ) -> Result<String, ReasonCode> {
        let request = ProseRequest {
            turn: record.turn,
            style,
            characters: characters.to_vec(),
            beats: beats(record).iter().map(Beat::sentence).collect(),
        };

        let generating = generator.generate(&request);
        let text = match tokio::time::timeout(self.config.generation_timeout, generating).await {
            Ok(Ok(text)) => text,
            Ok(Err(error)) => {
                warn!(turn = %record.turn, %error, "prose generator failed");
                return Err(ReasonCode::GenerationFailed);
            }
            Err(_) => {
                warn!(turn = %record.turn, "prose generator timed out");
                return Err(ReasonCode::GenerationFailed);
            }
        };

        let text = text.trim();
        if text.is_empty() {
            return Err(ReasonCode::GenerationFailed);
        }
        if let Some(missing) = characters.iter().find(|name| !mentions(text, name)) {
            debug!(turn = %record.turn, %missing, "generated prose omits a character");
            return Err(ReasonCode::MissingCharacter);
        }
        Ok(text.to_owned())
    }
}
