//! Trait definitions for external interactions
//!
//! These traits define the boundaries between domain logic and infrastructure.
//! Infrastructure implementations live in other crates.

use crate::{Entity, EntityId, Relationship, RelationshipId};

/// Trait for storing and retrieving entities and relationships
///
/// Implemented by the infrastructure layer (lorekeeper-store)
pub trait EntityStore {
    /// Error type for store operations
    type Error;

    /// Create a new entity
    ///
    /// Must reject a duplicate canonical name within the same campaign
    /// before any write occurs.
    fn create_entity(&mut self, entity: Entity) -> Result<EntityId, Self::Error>;

    /// Get an entity by id
    fn get_entity(&self, id: EntityId) -> Result<Option<Entity>, Self::Error>;

    /// List every entity in a campaign
    fn list_entities(&self, campaign_id: &str) -> Result<Vec<Entity>, Self::Error>;

    /// Append aliases to an existing entity, skipping duplicates
    fn append_aliases(&mut self, id: EntityId, aliases: &[String]) -> Result<(), Self::Error>;

    /// Create a new relationship
    ///
    /// Must reject a duplicate (source, target, type) triple within the
    /// campaign.
    fn create_relationship(
        &mut self,
        relationship: Relationship,
    ) -> Result<RelationshipId, Self::Error>;

    /// List every relationship in a campaign
    fn list_relationships(&self, campaign_id: &str) -> Result<Vec<Relationship>, Self::Error>;

    /// Record an uploaded source document for later reference
    fn record_document(
        &mut self,
        campaign_id: &str,
        name: &str,
        content: &str,
    ) -> Result<(), Self::Error>;

    /// Record that an entity was mentioned by a source document
    fn add_source_reference(
        &mut self,
        entity_id: EntityId,
        document_name: &str,
    ) -> Result<(), Self::Error>;
}

/// Trait for generative model calls
///
/// The model is an opaque collaborator: prompt in, text out. Implementations
/// are synchronous; async callers run them on a blocking thread
/// (`tokio::task::spawn_blocking`).
///
/// Implemented by the infrastructure layer (lorekeeper-llm)
pub trait LlmProvider {
    /// Error type for model operations
    type Error;

    /// Generate a completion for the given prompt
    fn generate(&self, prompt: &str) -> Result<String, Self::Error>;
}

/// Trait for post-commit search index synchronization
///
/// Indexing is fire-and-forget: commit spawns one indexing task per created
/// entity and does not roll anything back when indexing is slow or fails.
///
/// Implemented by the infrastructure layer (lorekeeper-store)
pub trait SearchIndex {
    /// Error type for index operations
    type Error;

    /// Add or refresh one entity in the search index
    fn index_entity(&self, entity: &Entity) -> Result<(), Self::Error>;
}
