//! Request, response, and streaming types for extraction

use lorekeeper_domain::Entity;
use serde::{Deserialize, Serialize};

/// One entity mention inside a single chunk, as returned by the model
///
/// Ephemeral: mentions exist only between the model call and the merge step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityMention {
    /// Name as written in the source text
    pub name: String,

    /// Open-ended type tag; the model may invent new types
    #[serde(rename = "type")]
    pub entity_type: String,

    /// Alternative names used in this chunk
    #[serde(default)]
    pub aliases: Vec<String>,

    /// What this chunk says about the entity
    #[serde(default)]
    pub description: String,

    /// Model confidence, clamped to [0, 1] at parse time
    #[serde(default = "default_confidence")]
    pub confidence: f64,
}

fn default_confidence() -> f64 {
    0.5
}

/// One relationship mention inside a single chunk
///
/// Endpoints are names, not ids - resolution happens at merge/commit time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationshipMention {
    /// Source entity name
    pub source: String,

    /// Target entity name
    pub target: String,

    /// Open-ended relationship type ("ally of", "located in", ...)
    #[serde(rename = "type")]
    pub relationship_type: String,

    /// Label shown when the edge is traversed backward
    #[serde(default)]
    pub reverse_label: Option<String>,

    /// Supporting text from the source
    #[serde(default)]
    pub excerpt: String,
}

/// The atomic output of one model call
///
/// A failed or timed-out call contributes `ChunkExtraction::empty()` - the
/// pipeline never fails wholesale because of one bad chunk.
#[derive(Debug, Clone, Default)]
pub struct ChunkExtraction {
    /// Entity mentions found in the chunk
    pub entities: Vec<EntityMention>,

    /// Relationship mentions found in the chunk
    pub relationships: Vec<RelationshipMention>,
}

impl ChunkExtraction {
    /// The degraded result for a failed chunk
    pub fn empty() -> Self {
        Self::default()
    }

    /// True when the chunk contributed nothing
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.relationships.is_empty()
    }
}

/// A merged, cross-linked entity candidate produced by the merger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedEntity {
    /// Ephemeral identifier; referenced by relationships and review decisions,
    /// never persisted
    pub temp_id: String,

    /// Display name (original casing from the first mention)
    pub name: String,

    /// Canonical form of the name
    pub canonical_name: String,

    /// Open-ended type tag
    pub entity_type: String,

    /// Merged aliases, deduplicated
    pub aliases: Vec<String>,

    /// Generated tags
    pub tags: Vec<String>,

    /// Generated wiki content with `[[Name]]` cross-links
    pub content: String,

    /// Highest confidence across merged mentions
    pub confidence: f64,
}

/// A deduplicated relationship candidate
///
/// Temp ids are set only when the endpoint survived the merge as a new
/// candidate; relationships whose endpoints did not are dropped at commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedRelationship {
    /// Source entity name as extracted
    pub source_name: String,

    /// Target entity name as extracted
    pub target_name: String,

    /// Temp id of the source candidate, when it survived the merge
    pub source_temp_id: Option<String>,

    /// Temp id of the target candidate, when it survived the merge
    pub target_temp_id: Option<String>,

    /// Open-ended relationship type
    pub relationship_type: String,

    /// Label shown when the edge is traversed backward
    pub reverse_label: Option<String>,

    /// Supporting text (first occurrence wins across chunks)
    pub excerpt: String,
}

/// A persisted entity's identity, as the matcher needs it
///
/// Ids travel as UUID strings here: the preview is a wire format and the
/// domain id type stays serde-free.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnownEntity {
    /// Persisted entity id (UUID string)
    pub id: String,

    /// Display name
    pub name: String,

    /// Canonical name
    pub canonical_name: String,

    /// Known aliases
    pub aliases: Vec<String>,
}

impl From<&Entity> for KnownEntity {
    fn from(entity: &Entity) -> Self {
        Self {
            id: entity.id.to_string(),
            name: entity.name.clone(),
            canonical_name: entity.canonical_name.clone(),
            aliases: entity.aliases.clone(),
        }
    }
}

/// Request to run the extraction pipeline over one document
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    /// Full document text (already plain text)
    pub content: String,

    /// Human-readable label for the source document
    pub source_label: String,

    /// Language for generated descriptions
    pub language: String,

    /// Entities already persisted in the target campaign
    pub known_entities: Vec<KnownEntity>,
}

/// The preview payload a reviewer sees
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractPreview {
    /// Candidate entities
    pub entities: Vec<ExtractedEntity>,

    /// Candidate relationships
    pub relationships: Vec<ExtractedRelationship>,

    /// Advisory matches against already-persisted entities
    pub matches: Vec<crate::matcher::EntityMatch>,
}

/// Aggregate numbers for the final summary line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionSummary {
    /// Chunks submitted to the model
    pub chunks_total: usize,

    /// Chunks that degraded to an empty extraction
    pub chunks_failed: usize,

    /// Candidate entities after merge
    pub entities_found: usize,

    /// Candidate relationships after dedup
    pub relationships_found: usize,

    /// Wall-clock time for the whole pipeline
    pub elapsed_ms: u64,
}

/// Result of a successful extraction run
#[derive(Debug, Clone)]
pub struct ExtractionOutcome {
    /// The reviewable preview
    pub preview: ExtractPreview,

    /// Run summary
    pub summary: ExtractionSummary,
}

/// Streaming progress events for interactive callers
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// A pipeline stage started or produced a status message
    Progress {
        /// Stage name ("chunking", "extracting", "merging")
        stage: String,
        /// Human-readable status
        message: String,
    },

    /// Chunk-level progress after each batch
    Extraction {
        /// Stage name
        stage: String,
        /// Chunks processed so far
        current: usize,
        /// Total chunks
        total: usize,
        /// Human-readable status
        message: String,
    },

    /// A candidate entity was discovered
    Entity {
        /// Candidate name
        name: String,
        /// Candidate type tag
        entity_type: String,
    },

    /// A terminal error; no `Complete` event will follow
    Error {
        /// What went wrong
        message: String,
    },

    /// The pipeline finished; carries the full reviewable preview
    Complete {
        /// The preview payload
        preview: ExtractPreview,
    },
}

/// Receiver for streaming progress events
///
/// Interactive flows (uploads) forward these to the client; batch callers can
/// use [`NullObserver`].
pub trait ProgressObserver: Send + Sync {
    /// Handle one event
    fn on_event(&self, event: ProgressEvent);
}

/// Observer that discards every event
pub struct NullObserver;

impl ProgressObserver for NullObserver {
    fn on_event(&self, _event: ProgressEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_extraction_empty() {
        let extraction = ChunkExtraction::empty();
        assert!(extraction.is_empty());
        assert!(extraction.entities.is_empty());
        assert!(extraction.relationships.is_empty());
    }

    #[test]
    fn test_known_entity_from_domain() {
        let mut entity = Entity::new("c1", "Grok the Bold", "person", 0);
        entity.aliases = vec!["Grok".to_string()];

        let known = KnownEntity::from(&entity);
        assert_eq!(known.name, "Grok the Bold");
        assert_eq!(known.canonical_name, "grok-the-bold");
        assert_eq!(known.aliases, vec!["Grok"]);
        assert_eq!(known.id, entity.id.to_string());
    }

    #[test]
    fn test_mention_deserialization_defaults() {
        let json = r#"{"name": "Grok", "type": "person"}"#;
        let mention: EntityMention = serde_json::from_str(json).unwrap();

        assert_eq!(mention.name, "Grok");
        assert!(mention.aliases.is_empty());
        assert_eq!(mention.description, "");
        assert_eq!(mention.confidence, 0.5);
    }
}
