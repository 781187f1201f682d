//! Shared helpers for runner integration tests.
#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use skald_core::repository::CampaignLogRepository;
use skald_runner::{AppError, Campaign, RunnerConfig, Scenario, Services};
use skald_test_support::fixed_clock;

/// Two adventurers in a hall next to a crypt.
pub const SCENARIO: &str = "
world:
  locations:
    - { id: hall, name: the Hall, exits: [crypt] }
    - { id: crypt, name: the Crypt, exits: [hall] }
  entities:
    - { id: aria, name: Aria, location: hall }
    - { id: borin, name: Borin, location: hall }
  resources:
    - { id: idol, name: the Idol, location: crypt }
characters:
  - id: aria
    name: Aria
    role: explorer
    allowed_actions: [move, observe, search, claim]
    initiative: 2
  - id: borin
    name: Borin
    role: guard
    allowed_actions: [observe, rest]
    initiative: 1
";

pub fn scenario() -> Scenario {
    Scenario::parse(SCENARIO).unwrap()
}

/// Runner config with short deadlines, reading nothing from the process
/// environment.
pub fn config(extra: &[(&str, &str)]) -> RunnerConfig {
    let mut pairs: Vec<(String, String)> = vec![
        ("SKALD_SCENARIO".into(), "scenario.yaml".into()),
        ("SKALD_AGENT_DEADLINE_MS".into(), "500".into()),
        ("SKALD_TURN_DEADLINE_MS".into(), "2000".into()),
    ];
    pairs.extend(extra.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())));
    let lookup = move |key: &str| {
        pairs
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    };
    RunnerConfig::from_lookup(&lookup).unwrap()
}

pub async fn assemble(
    scenario: &Scenario,
    log: Arc<dyn CampaignLogRepository>,
    services: Services,
) -> Result<Campaign, AppError> {
    Campaign::assemble(&config(&[]), scenario, log, services, fixed_clock()).await
}

/// A fresh file path under the system temp directory.
pub fn temp_log_path() -> PathBuf {
    std::env::temp_dir().join(format!("skald-{}.jsonl", uuid::Uuid::new_v4()))
}
