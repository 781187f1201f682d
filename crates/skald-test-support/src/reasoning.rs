//! Test reasoning services.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use skald_core::ids::AgentId;
use skald_core::service::{ReasoningRequest, ReasoningResponse, ReasoningService, ServiceError};

/// Answers with a scripted label per agent and records every request.
/// Agents without a script get a malformed-response error.
#[derive(Debug, Default)]
pub struct ScriptedReasoningService {
    choices: HashMap<AgentId, ReasoningResponse>,
    requests: Mutex<Vec<ReasoningRequest>>,
}

impl ScriptedReasoningService {
    /// An empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts `agent` to choose `label` with `rationale`.
    #[must_use]
    pub fn with_choice(mut self, agent: &str, label: &str, rationale: &str) -> Self {
        self.choices.insert(
            AgentId::new(agent),
            ReasoningResponse {
                chosen_action: label.to_owned(),
                rationale_text: rationale.to_owned(),
            },
        );
        self
    }

    /// Returns every request received so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn requests(&self) -> Vec<ReasoningRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReasoningService for ScriptedReasoningService {
    async fn choose(&self, request: &ReasoningRequest) -> Result<ReasoningResponse, ServiceError> {
        self.requests.lock().unwrap().push(request.clone());
        self.choices
            .get(&request.agent_id)
            .cloned()
            .ok_or_else(|| ServiceError::Malformed("no scripted choice".into()))
    }
}

/// Fails every call as if the service could not be reached.
#[derive(Debug, Default)]
pub struct UnreachableReasoningService {
    calls: AtomicUsize,
}

impl UnreachableReasoningService {
    /// Returns how many calls were attempted.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReasoningService for UnreachableReasoningService {
    async fn choose(&self, _request: &ReasoningRequest) -> Result<ReasoningResponse, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ServiceError::Unavailable("connection refused".into()))
    }
}

/// Never answers.
#[derive(Debug, Default)]
pub struct StalledReasoningService;

#[async_trait]
impl ReasoningService for StalledReasoningService {
    async fn choose(&self, _request: &ReasoningRequest) -> Result<ReasoningResponse, ServiceError> {
        std::future::pending().await
    }
}

/// Waits `delay`, then chooses the first offered action.
#[derive(Debug)]
pub struct SlowReasoningService {
    delay: Duration,
}

impl SlowReasoningService {
    /// A service that answers after `delay`.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl ReasoningService for SlowReasoningService {
    async fn choose(&self, request: &ReasoningRequest) -> Result<ReasoningResponse, ServiceError> {
        tokio::time::sleep(self.delay).await;
        let first = request
            .allowed_actions
            .first()
            .ok_or_else(|| ServiceError::Malformed("nothing to choose from".into()))?;
        Ok(ReasoningResponse {
            chosen_action: first.label.clone(),
            rationale_text: "took my time".to_owned(),
        })
    }
}
