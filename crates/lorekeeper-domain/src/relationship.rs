//! Relationship module - the directed, typed edges of the knowledge graph

use crate::EntityId;
use std::fmt;

/// Unique identifier for a relationship based on UUIDv7
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RelationshipId(u128);

impl RelationshipId {
    /// Generate a new UUIDv7-based RelationshipId
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().as_u128())
    }

    /// Create a RelationshipId from a raw u128 value
    ///
    /// This is primarily for storage layer deserialization.
    pub fn from_value(value: u128) -> Self {
        Self(value)
    }

    /// Get the raw u128 value
    pub fn value(&self) -> u128 {
        self.0
    }
}

impl Default for RelationshipId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RelationshipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_u128(self.0))
    }
}

/// A persisted relationship between two entities
///
/// The relationship type is an open string tag ("ally of", "located in", ...).
/// A campaign allows at most one relationship per
/// (source, target, relationship_type) triple; the storage layer enforces
/// this uniqueness.
#[derive(Debug, Clone, PartialEq)]
pub struct Relationship {
    /// Unique identifier
    pub id: RelationshipId,

    /// Campaign (workspace) this relationship belongs to
    pub campaign_id: String,

    /// Source entity (the edge points away from this entity)
    pub source_entity_id: EntityId,

    /// Target entity (the edge points toward this entity)
    pub target_entity_id: EntityId,

    /// Open-ended relationship type ("ally of", "rules", "located in", ...)
    pub relationship_type: String,

    /// Label shown when the edge is traversed backward ("ruled by" for "rules")
    pub reverse_label: Option<String>,

    /// When this relationship was created (Unix seconds)
    pub created_at: u64,
}

impl Relationship {
    /// Create a new relationship
    pub fn new(
        campaign_id: impl Into<String>,
        source_entity_id: EntityId,
        target_entity_id: EntityId,
        relationship_type: impl Into<String>,
        created_at: u64,
    ) -> Self {
        Self {
            id: RelationshipId::new(),
            campaign_id: campaign_id.into(),
            source_entity_id,
            target_entity_id,
            relationship_type: relationship_type.into(),
            reverse_label: None,
            created_at,
        }
    }

    /// Attach a reverse traversal label
    pub fn with_reverse_label(mut self, label: impl Into<String>) -> Self {
        self.reverse_label = Some(label.into());
        self
    }
}
