//! The extraction pipeline entry point

use crate::chunking::TextChunker;
use crate::config::ExtractionSettings;
use crate::error::ExtractorError;
use crate::matcher;
use crate::merger;
use crate::orchestrator;
use crate::types::{
    ExtractPreview, ExtractionOutcome, ExtractionRequest, ExtractionSummary, ProgressEvent,
    ProgressObserver,
};
use lorekeeper_domain::traits::LlmProvider;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Runs the full extraction pipeline over one document
///
/// chunk -> orchestrate model calls -> merge -> match, with streaming
/// progress along the way. The whole run races the overall pipeline timeout;
/// when that fires, partial results are abandoned and a terminal error is
/// returned - per-chunk failures, by contrast, degrade silently to empty
/// extractions.
pub struct Extractor<L> {
    provider: Arc<L>,
    settings: ExtractionSettings,
}

impl<L> Extractor<L>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: std::fmt::Display + Send + 'static,
{
    /// Create a new extractor
    pub fn new(provider: L, settings: ExtractionSettings) -> Self {
        Self {
            provider: Arc::new(provider),
            settings,
        }
    }

    /// The settings this extractor runs with
    pub fn settings(&self) -> &ExtractionSettings {
        &self.settings
    }

    /// Extract a reviewable preview from one document
    pub async fn extract(
        &self,
        request: ExtractionRequest,
        observer: &dyn ProgressObserver,
    ) -> Result<ExtractionOutcome, ExtractorError> {
        self.settings
            .validate()
            .map_err(ExtractorError::InvalidSettings)?;

        let started = Instant::now();

        observer.on_event(ProgressEvent::Progress {
            stage: "chunking".to_string(),
            message: format!("Splitting '{}' into sections", request.source_label),
        });

        let chunker = TextChunker::new(self.settings.chunk_size);
        let mut chunks = chunker.chunk(&request.content);

        if chunks.len() > self.settings.max_chunks {
            warn!(
                "'{}' produced {} chunks; extracting only the first {}",
                request.source_label,
                chunks.len(),
                self.settings.max_chunks
            );
            observer.on_event(ProgressEvent::Progress {
                stage: "chunking".to_string(),
                message: format!(
                    "Document is large: analyzing the first {} of {} sections",
                    self.settings.max_chunks,
                    chunks.len()
                ),
            });
            chunks.truncate(self.settings.max_chunks);
        }

        info!(
            "Extracting '{}': {} chunks, batch size {}",
            request.source_label,
            chunks.len(),
            self.settings.parallel_batch_size
        );

        observer.on_event(ProgressEvent::Progress {
            stage: "extracting".to_string(),
            message: format!("Analyzing {} sections", chunks.len()),
        });

        let known_names: Vec<String> = request
            .known_entities
            .iter()
            .map(|k| k.name.clone())
            .collect();

        let batches = orchestrator::run_batches(
            &self.provider,
            &chunks,
            &request.language,
            &known_names,
            &self.settings,
            observer,
        );

        // The overall deadline wraps the whole orchestration. When it fires,
        // in-flight chunk work is abandoned (dropped, not cancelled) and no
        // partial result is returned.
        let output = match tokio::time::timeout(self.settings.pipeline_timeout(), batches).await {
            Ok(output) => output,
            Err(_) => {
                let seconds = self.settings.pipeline_timeout_secs;
                observer.on_event(ProgressEvent::Error {
                    message: format!("Extraction timed out after {}s", seconds),
                });
                return Err(ExtractorError::PipelineTimeout(seconds));
            }
        };

        observer.on_event(ProgressEvent::Progress {
            stage: "merging".to_string(),
            message: "Merging results across sections".to_string(),
        });

        let merged = merger::merge_extractions(&output.extractions, &known_names);
        let matches = matcher::find_existing_matches(&merged.entities, &request.known_entities);

        info!(
            "Extraction of '{}' finished: {} entities, {} relationships, {} matches, {} failed chunks",
            request.source_label,
            merged.entities.len(),
            merged.relationships.len(),
            matches.len(),
            output.failed_chunks
        );

        let preview = ExtractPreview {
            entities: merged.entities,
            relationships: merged.relationships,
            matches,
        };

        observer.on_event(ProgressEvent::Complete {
            preview: preview.clone(),
        });

        let summary = ExtractionSummary {
            chunks_total: chunks.len(),
            chunks_failed: output.failed_chunks,
            entities_found: preview.entities.len(),
            relationships_found: preview.relationships.len(),
            elapsed_ms: started.elapsed().as_millis() as u64,
        };

        Ok(ExtractionOutcome { preview, summary })
    }
}
