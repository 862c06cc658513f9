//! The commit step: persist approved candidates with per-item tolerance
//!
//! Commit writes each entity and relationship independently: one failure is
//! logged and skipped, never aborting the remainder of the batch. Extraction
//! batches are large and individually low-value, so "commit as much as
//! successfully can" beats all-or-nothing here. After the writes, one index
//! task is spawned per created entity and the group is awaited under a single
//! deadline; tasks that miss it are detached, not cancelled, and the entity
//! still counts as committed.

use crate::error::ReviewError;
use crate::staging::ReviewQueue;
use lorekeeper_domain::traits::{EntityStore, SearchIndex};
use lorekeeper_domain::{Entity, EntityId, Relationship};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, warn};

/// What to commit, and into which campaign
#[derive(Debug, Clone)]
pub struct CommitRequest {
    /// Target campaign
    pub campaign_id: String,

    /// Name of the source document, recorded against every committed entity
    pub document_name: String,

    /// Full text of the source document
    pub document_content: String,
}

/// Commit tuning knobs
#[derive(Debug, Clone)]
pub struct CommitOptions {
    /// Aggregate deadline for post-commit index sync (seconds)
    pub index_timeout_secs: u64,
}

impl Default for CommitOptions {
    fn default() -> Self {
        Self {
            index_timeout_secs: 10,
        }
    }
}

/// One successfully committed candidate
#[derive(Debug, Clone)]
pub struct CommittedEntity {
    /// The candidate's temp id
    pub temp_id: String,

    /// The persisted entity id (new, or the merge target)
    pub entity_id: EntityId,

    /// Display name
    pub name: String,
}

/// Post-commit index sync accounting
#[derive(Debug, Clone, Default)]
pub struct IndexSyncStatus {
    /// Index tasks spawned (one per created entity)
    pub total: usize,

    /// Finished successfully before the deadline
    pub succeeded: usize,

    /// Finished with an error
    pub failed: usize,

    /// Still running at the deadline; detached, result unknown
    pub pending: usize,
}

/// The commit report: partial success is the expected common case
#[derive(Debug, Clone, Default)]
pub struct CommitReport {
    /// Newly created entities
    pub created: Vec<CommittedEntity>,

    /// Candidates merged into existing entities
    pub merged: Vec<CommittedEntity>,

    /// Relationships written
    pub relationships_created: usize,

    /// Entities that failed and were skipped
    pub entities_skipped: usize,

    /// Relationships that failed and were skipped
    pub relationships_skipped: usize,

    /// Index sync accounting
    pub index: IndexSyncStatus,
}

/// Commits reviewed candidates into an `EntityStore`
pub struct Committer<I> {
    index: Arc<I>,
    options: CommitOptions,
}

impl<I> Committer<I>
where
    I: SearchIndex + Send + Sync + 'static,
    I::Error: std::fmt::Display,
{
    /// Create a committer over the given search index
    pub fn new(index: I) -> Self {
        Self {
            index: Arc::new(index),
            options: CommitOptions::default(),
        }
    }

    /// Override the default options
    pub fn with_options(mut self, options: CommitOptions) -> Self {
        self.options = options;
        self
    }

    /// Commit every approved or edited candidate in the queue
    ///
    /// Relationships are written only when both endpoints committed in this
    /// batch (as a new entity or a merge target); the rest are expected
    /// fallout of review decisions, dropped without ceremony.
    pub async fn commit<S>(
        &self,
        queue: &ReviewQueue,
        request: &CommitRequest,
        store: &mut S,
    ) -> Result<CommitReport, ReviewError>
    where
        S: EntityStore,
        S::Error: std::fmt::Display,
    {
        store
            .record_document(
                &request.campaign_id,
                &request.document_name,
                &request.document_content,
            )
            .map_err(|e| ReviewError::Store(e.to_string()))?;

        let created_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        let mut report = CommitReport::default();
        let mut committed: HashMap<&str, EntityId> = HashMap::new();
        let mut to_index: Vec<Entity> = Vec::new();

        for staged in queue.approved_entities() {
            match staged.merge_target_id {
                Some(target) => {
                    // Merge: no new entity; the target absorbs the aliases
                    // and gains a source reference
                    let result = store
                        .append_aliases(target, &staged.aliases)
                        .and_then(|_| store.add_source_reference(target, &request.document_name));
                    match result {
                        Ok(()) => {
                            committed.insert(staged.temp_id.as_str(), target);
                            report.merged.push(CommittedEntity {
                                temp_id: staged.temp_id.clone(),
                                entity_id: target,
                                name: staged.name.clone(),
                            });
                        }
                        Err(e) => {
                            warn!("Skipping merge of '{}': {}", staged.name, e);
                            report.entities_skipped += 1;
                        }
                    }
                }
                None => {
                    let mut entity = Entity::new(
                        &request.campaign_id,
                        &staged.name,
                        &staged.entity_type,
                        created_at,
                    );
                    entity.content = staged.content.clone();
                    entity.aliases = staged.aliases.clone();
                    entity.tags = staged.tags.clone();

                    match store.create_entity(entity.clone()) {
                        Ok(id) => {
                            committed.insert(staged.temp_id.as_str(), id);
                            report.created.push(CommittedEntity {
                                temp_id: staged.temp_id.clone(),
                                entity_id: id,
                                name: staged.name.clone(),
                            });
                            to_index.push(entity);

                            if let Err(e) =
                                store.add_source_reference(id, &request.document_name)
                            {
                                warn!("Source reference for '{}' failed: {}", staged.name, e);
                            }
                        }
                        Err(e) => {
                            warn!("Skipping entity '{}': {}", staged.name, e);
                            report.entities_skipped += 1;
                        }
                    }
                }
            }
        }

        for staged_rel in queue.relationships() {
            let source = committed.get(staged_rel.source_temp_id.as_str());
            let target = committed.get(staged_rel.target_temp_id.as_str());
            let (source, target) = match (source, target) {
                (Some(&s), Some(&t)) => (s, t),
                _ => {
                    // Expected, not exceptional: an endpoint was rejected or
                    // never staged
                    debug!(
                        "Dropping relationship '{}' ({} -> {}): endpoint not committed",
                        staged_rel.relationship_type,
                        staged_rel.source_temp_id,
                        staged_rel.target_temp_id
                    );
                    continue;
                }
            };

            let mut relationship = Relationship::new(
                &request.campaign_id,
                source,
                target,
                &staged_rel.relationship_type,
                created_at,
            );
            if let Some(label) = &staged_rel.reverse_label {
                relationship = relationship.with_reverse_label(label);
            }

            match store.create_relationship(relationship) {
                Ok(_) => report.relationships_created += 1,
                Err(e) => {
                    warn!(
                        "Skipping relationship '{}': {}",
                        staged_rel.relationship_type, e
                    );
                    report.relationships_skipped += 1;
                }
            }
        }

        report.index = self.sync_index(to_index).await;

        info!(
            "Commit into '{}': {} created, {} merged, {} relationships, {} skipped",
            request.campaign_id,
            report.created.len(),
            report.merged.len(),
            report.relationships_created,
            report.entities_skipped
        );

        Ok(report)
    }

    /// Fire-and-forget index sync with an aggregate deadline
    ///
    /// Tasks past the deadline keep running on their threads (their eventual
    /// writes go through if the store allows it) but are reported as pending.
    async fn sync_index(&self, entities: Vec<Entity>) -> IndexSyncStatus {
        let mut status = IndexSyncStatus {
            total: entities.len(),
            ..Default::default()
        };

        let mut handles = Vec::with_capacity(entities.len());
        for entity in entities {
            let index = Arc::clone(&self.index);
            handles.push(tokio::task::spawn_blocking(move || {
                index.index_entity(&entity).map_err(|e| e.to_string())
            }));
        }

        let deadline = Instant::now() + Duration::from_secs(self.options.index_timeout_secs);
        for handle in handles {
            match timeout_at(deadline, handle).await {
                Err(_) => status.pending += 1,
                Ok(Err(join_error)) => {
                    warn!("Index task failed to run: {}", join_error);
                    status.failed += 1;
                }
                Ok(Ok(Err(e))) => {
                    warn!("Index sync failed: {}", e);
                    status.failed += 1;
                }
                Ok(Ok(Ok(()))) => status.succeeded += 1,
            }
        }

        status
    }
}
