//! Scenario documents: a world plus the characters that inhabit it.

use std::path::Path;

use serde::Deserialize;
use skald_core::world::WorldDocument;

use crate::error::AppError;

/// A parsed scenario.
///
/// Characters stay as raw YAML so each profile is validated by the Director
/// when it is registered.
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub world: WorldDocument,
    #[serde(default)]
    pub characters: Vec<serde_yaml::Value>,
}

impl Scenario {
    /// Parses a scenario from YAML.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Scenario` if the document does not parse.
    pub fn parse(document: &str) -> Result<Self, AppError> {
        serde_yaml::from_str(document).map_err(|e| AppError::Scenario(e.to_string()))
    }

    /// Reads and parses the scenario at `path`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Scenario` if the file cannot be read or parsed.
    pub async fn load(path: &Path) -> Result<Self, AppError> {
        let document = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| AppError::Scenario(format!("{}: {e}", path.display())))?;
        Self::parse(&document)
    }

    /// Each character profile as a standalone YAML document.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Scenario` if a profile cannot be re-serialized.
    pub fn profile_documents(&self) -> Result<Vec<String>, AppError> {
        self.characters
            .iter()
            .map(|profile| {
                serde_yaml::to_string(profile).map_err(|e| AppError::Scenario(e.to_string()))
            })
            .collect()
    }
}
