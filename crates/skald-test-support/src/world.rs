//! Fluent builder for test worlds.

use skald_core::ids::{EntityId, FactId, LocationId, ResourceId};
use skald_core::world::{
    Entity, EntityStatus, Fact, Location, Resource, WorldDocument, WorldState,
};

/// Builds small worlds for tests.
#[derive(Debug, Default)]
pub struct WorldBuilder {
    document: WorldDocument,
}

impl WorldBuilder {
    /// An empty world.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a location. Exits are one-way; use [`WorldBuilder::connect`]
    /// for two-way passages.
    #[must_use]
    pub fn location(mut self, id: &str, capacity: Option<u32>) -> Self {
        self.document.locations.push(Location {
            id: LocationId::new(id),
            name: title_case(id),
            capacity,
            exits: std::collections::BTreeSet::new(),
        });
        self
    }

    /// Links two locations in both directions.
    ///
    /// # Panics
    ///
    /// Panics if either location has not been added yet.
    #[must_use]
    pub fn connect(mut self, a: &str, b: &str) -> Self {
        for (from, to) in [(a, b), (b, a)] {
            self.document
                .locations
                .iter_mut()
                .find(|l| l.id.as_str() == from)
                .expect("connect: unknown location")
                .exits
                .insert(LocationId::new(to));
        }
        self
    }

    /// Adds an active entity with 10 health.
    #[must_use]
    pub fn entity(mut self, id: &str, name: &str, at: &str) -> Self {
        self.document.entities.push(Entity {
            id: EntityId::new(id),
            name: name.to_owned(),
            location: LocationId::new(at),
            status: EntityStatus::Active,
            health: 10,
            max_health: 10,
        });
        self
    }

    /// Adds an entity with custom health.
    #[must_use]
    pub fn wounded_entity(mut self, id: &str, name: &str, at: &str, health: i32) -> Self {
        self.document.entities.push(Entity {
            id: EntityId::new(id),
            name: name.to_owned(),
            location: LocationId::new(at),
            status: if health > 0 {
                EntityStatus::Active
            } else {
                EntityStatus::Downed
            },
            health,
            max_health: 10,
        });
        self
    }

    /// Adds an unheld resource.
    #[must_use]
    pub fn resource(mut self, id: &str, at: &str) -> Self {
        self.document.resources.push(Resource {
            id: ResourceId::new(id),
            name: title_case(id),
            location: LocationId::new(at),
            holder: None,
        });
        self
    }

    /// Adds an undiscovered fact.
    #[must_use]
    pub fn fact(mut self, id: &str, at: &str, text: &str) -> Self {
        self.document.facts.push(Fact {
            id: FactId::new(id),
            text: text.to_owned(),
            location: LocationId::new(at),
            discovered_by: std::collections::BTreeSet::new(),
        });
        self
    }

    /// Returns the raw document.
    #[must_use]
    pub fn document(self) -> WorldDocument {
        self.document
    }

    /// Builds the world.
    ///
    /// # Panics
    ///
    /// Panics if the world is inconsistent.
    #[must_use]
    pub fn build(self) -> WorldState {
        WorldState::from_document(self.document).expect("test world must be consistent")
    }
}

fn title_case(id: &str) -> String {
    let mut chars = id.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
