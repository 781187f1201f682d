//! The agent registry.

use skald_adjudication::Capabilities;
use skald_core::error::DomainError;
use skald_core::ids::AgentId;
use skald_persona::Agent;

/// Registered agents in registration order.
///
/// Registration order is a tie-break input, so removals keep the relative
/// order of the remaining agents.
#[derive(Debug, Default)]
pub struct AgentRegistry {
    agents: Vec<Agent>,
}

impl AgentRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `agent` at the end of the registration order.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::DuplicateAgent` if the id is already taken.
    pub fn register(&mut self, agent: Agent) -> Result<(), DomainError> {
        if self.contains(agent.id()) {
            return Err(DomainError::DuplicateAgent(agent.id().clone()));
        }
        self.agents.push(agent);
        Ok(())
    }

    /// Removes and returns the agent.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AgentNotFound` if no such agent is registered.
    pub fn remove(&mut self, id: &AgentId) -> Result<Agent, DomainError> {
        let index = self
            .position(id)
            .ok_or_else(|| DomainError::AgentNotFound(id.clone()))?;
        Ok(self.agents.remove(index))
    }

    /// Whether an agent with `id` is registered.
    #[must_use]
    pub fn contains(&self, id: &AgentId) -> bool {
        self.position(id).is_some()
    }

    /// Registration rank of `id`; lower registered earlier.
    #[must_use]
    pub fn position(&self, id: &AgentId) -> Option<usize> {
        self.agents.iter().position(|a| a.id() == id)
    }

    /// Looks up an agent.
    #[must_use]
    pub fn get(&self, id: &AgentId) -> Option<&Agent> {
        self.agents.iter().find(|a| a.id() == id)
    }

    /// Looks up an agent mutably.
    pub fn get_mut(&mut self, id: &AgentId) -> Option<&mut Agent> {
        self.agents.iter_mut().find(|a| a.id() == id)
    }

    /// Iterates in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Agent> {
        self.agents.iter()
    }

    /// Iterates mutably in registration order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Agent> {
        self.agents.iter_mut()
    }

    /// Number of agents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// The allowed action kinds of every agent.
    #[must_use]
    pub fn capabilities(&self) -> Capabilities {
        self.agents
            .iter()
            .map(|a| {
                (
                    a.id().clone(),
                    a.profile().allowed_actions.iter().copied().collect(),
                )
            })
            .collect()
    }
}
