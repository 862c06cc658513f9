//! Staged candidates and the reviewer decision state machine
//!
//! Every candidate starts `Pending`. Approve and reject toggle between
//! `Approved` and `Rejected` (a rejected entity can be un-rejected, but
//! nothing silently returns to `Pending` short of `reset_all`). Editing any
//! field sets `Edited`, which counts as approved for commit purposes, and
//! assigning a merge target forces `Approved`.

use crate::error::ReviewError;
use lorekeeper_domain::{canonicalize, EntityId};
use lorekeeper_extractor::{ExtractPreview, ExtractedEntity};

/// Review state of one staged entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewStatus {
    /// Awaiting a reviewer decision
    Pending,

    /// Approved for commit
    Approved,

    /// Excluded from commit
    Rejected,

    /// Field-edited by the reviewer; treated as approved for commit
    Edited,
}

impl ReviewStatus {
    /// Whether this status commits
    pub fn counts_as_approved(&self) -> bool {
        matches!(self, ReviewStatus::Approved | ReviewStatus::Edited)
    }
}

/// A reviewable entity candidate
///
/// `temp_id` is ephemeral: it ties reviewer decisions and staged
/// relationships to this candidate and is never persisted.
#[derive(Debug, Clone)]
pub struct StagedEntity {
    /// Ephemeral identifier from the extraction preview
    pub temp_id: String,

    /// Display name
    pub name: String,

    /// Canonical form of the name (recomputed when the name is edited)
    pub canonical_name: String,

    /// Open-ended type tag
    pub entity_type: String,

    /// Aliases
    pub aliases: Vec<String>,

    /// Tags
    pub tags: Vec<String>,

    /// Generated wiki content
    pub content: String,

    /// Extraction confidence
    pub confidence: f64,

    /// Current review state
    pub status: ReviewStatus,

    /// Persisted entity to merge into instead of creating new
    pub merge_target_id: Option<EntityId>,
}

impl StagedEntity {
    fn from_extracted(extracted: ExtractedEntity) -> Self {
        Self {
            temp_id: extracted.temp_id,
            name: extracted.name,
            canonical_name: extracted.canonical_name,
            entity_type: extracted.entity_type,
            aliases: extracted.aliases,
            tags: extracted.tags,
            content: extracted.content,
            confidence: extracted.confidence,
            status: ReviewStatus::Pending,
            merge_target_id: None,
        }
    }
}

/// A reviewable relationship candidate
///
/// Both endpoints reference staged entity temp ids; relationships whose
/// endpoints do not commit are dropped at commit time.
#[derive(Debug, Clone)]
pub struct StagedRelationship {
    /// Ephemeral identifier
    pub temp_id: String,

    /// Temp id of the source candidate
    pub source_temp_id: String,

    /// Temp id of the target candidate
    pub target_temp_id: String,

    /// Open-ended relationship type
    pub relationship_type: String,

    /// Label for backward traversal
    pub reverse_label: Option<String>,

    /// Supporting text
    pub excerpt: String,
}

/// A reviewer edit; unset fields keep their current values
#[derive(Debug, Clone, Default)]
pub struct EntityEdit {
    /// New display name (canonical name is recomputed)
    pub name: Option<String>,

    /// New type tag
    pub entity_type: Option<String>,

    /// New wiki content
    pub content: Option<String>,

    /// Replacement alias list
    pub aliases: Option<Vec<String>>,

    /// Replacement tag list
    pub tags: Option<Vec<String>>,
}

/// The set of staged candidates under review
#[derive(Debug, Clone, Default)]
pub struct ReviewQueue {
    entities: Vec<StagedEntity>,
    relationships: Vec<StagedRelationship>,
}

impl ReviewQueue {
    /// Stage an extraction preview for review
    ///
    /// Relationships survive staging only when both endpoints resolved to a
    /// candidate; the rest were advisory context in the preview.
    pub fn from_preview(preview: ExtractPreview) -> Self {
        let entities = preview
            .entities
            .into_iter()
            .map(StagedEntity::from_extracted)
            .collect();

        let relationships = preview
            .relationships
            .into_iter()
            .enumerate()
            .filter_map(|(i, rel)| {
                let source_temp_id = rel.source_temp_id?;
                let target_temp_id = rel.target_temp_id?;
                Some(StagedRelationship {
                    temp_id: format!("staged-rel-{}", i + 1),
                    source_temp_id,
                    target_temp_id,
                    relationship_type: rel.relationship_type,
                    reverse_label: rel.reverse_label,
                    excerpt: rel.excerpt,
                })
            })
            .collect();

        Self {
            entities,
            relationships,
        }
    }

    /// The staged entities
    pub fn entities(&self) -> &[StagedEntity] {
        &self.entities
    }

    /// The staged relationships
    pub fn relationships(&self) -> &[StagedRelationship] {
        &self.relationships
    }

    fn entity_mut(&mut self, temp_id: &str) -> Result<&mut StagedEntity, ReviewError> {
        self.entities
            .iter_mut()
            .find(|e| e.temp_id == temp_id)
            .ok_or_else(|| ReviewError::UnknownTempId(temp_id.to_string()))
    }

    /// Approve one candidate (also un-rejects)
    pub fn approve(&mut self, temp_id: &str) -> Result<(), ReviewError> {
        self.entity_mut(temp_id)?.status = ReviewStatus::Approved;
        Ok(())
    }

    /// Reject one candidate
    pub fn reject(&mut self, temp_id: &str) -> Result<(), ReviewError> {
        self.entity_mut(temp_id)?.status = ReviewStatus::Rejected;
        Ok(())
    }

    /// Apply a field edit; always sets status to `Edited`
    pub fn edit(&mut self, temp_id: &str, edit: EntityEdit) -> Result<(), ReviewError> {
        let entity = self.entity_mut(temp_id)?;

        if let Some(name) = edit.name {
            entity.canonical_name = canonicalize(&name);
            entity.name = name;
        }
        if let Some(entity_type) = edit.entity_type {
            entity.entity_type = entity_type;
        }
        if let Some(content) = edit.content {
            entity.content = content;
        }
        if let Some(aliases) = edit.aliases {
            entity.aliases = aliases;
        }
        if let Some(tags) = edit.tags {
            entity.tags = tags;
        }

        entity.status = ReviewStatus::Edited;
        Ok(())
    }

    /// Point a candidate at a persisted entity to merge into; forces approval
    pub fn set_merge_target(
        &mut self,
        temp_id: &str,
        target: EntityId,
    ) -> Result<(), ReviewError> {
        let entity = self.entity_mut(temp_id)?;
        entity.merge_target_id = Some(target);
        entity.status = ReviewStatus::Approved;
        Ok(())
    }

    /// Approve every candidate still `Pending`; returns how many changed
    pub fn approve_all_pending(&mut self) -> usize {
        self.bulk_transition(ReviewStatus::Approved)
    }

    /// Reject every candidate still `Pending`; returns how many changed
    pub fn reject_all_pending(&mut self) -> usize {
        self.bulk_transition(ReviewStatus::Rejected)
    }

    fn bulk_transition(&mut self, to: ReviewStatus) -> usize {
        let mut changed = 0;
        for entity in &mut self.entities {
            if entity.status == ReviewStatus::Pending {
                entity.status = to;
                changed += 1;
            }
        }
        changed
    }

    /// Return every candidate to `Pending` and clear merge targets
    pub fn reset_all(&mut self) {
        for entity in &mut self.entities {
            entity.status = ReviewStatus::Pending;
            entity.merge_target_id = None;
        }
    }

    /// Candidates that will commit (`Approved` or `Edited`)
    pub fn approved_entities(&self) -> impl Iterator<Item = &StagedEntity> {
        self.entities.iter().filter(|e| e.status.counts_as_approved())
    }
}
