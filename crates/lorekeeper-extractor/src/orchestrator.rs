//! Bounded-concurrency orchestration of model calls
//!
//! Chunks are processed in sequential batches; within a batch every chunk
//! call runs concurrently on a blocking thread and races its own timeout.
//! A timed-out or failed call degrades to an empty extraction - the pipeline
//! never fails wholesale because of one bad chunk. A timed-out provider call
//! keeps running on its thread; its result is simply never read.

use crate::config::ExtractionSettings;
use crate::parser;
use crate::prompt::PromptBuilder;
use crate::types::{ChunkExtraction, ProgressEvent, ProgressObserver};
use lorekeeper_domain::traits::LlmProvider;
use std::sync::Arc;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, warn};

/// Per-chunk results plus failure accounting
pub(crate) struct OrchestratorOutput {
    /// One extraction per chunk, in chunk order (empty on failure)
    pub extractions: Vec<ChunkExtraction>,

    /// How many chunks degraded to an empty extraction
    pub failed_chunks: usize,
}

/// Run every chunk through the model in batches of
/// `settings.parallel_batch_size`
pub(crate) async fn run_batches<L>(
    provider: &Arc<L>,
    chunks: &[String],
    language: &str,
    known_names: &[String],
    settings: &ExtractionSettings,
    observer: &dyn ProgressObserver,
) -> OrchestratorOutput
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: std::fmt::Display + Send + 'static,
{
    let total = chunks.len();
    let mut extractions = Vec::with_capacity(total);
    let mut failed_chunks = 0;

    for (batch_index, batch) in chunks.chunks(settings.parallel_batch_size).enumerate() {
        let base = batch_index * settings.parallel_batch_size;

        // Issue every call in the batch concurrently; each gets its own
        // deadline measured from spawn, not from when we start awaiting it.
        let mut handles = Vec::with_capacity(batch.len());
        for (offset, chunk) in batch.iter().enumerate() {
            let chunk_index = base + offset;
            let provider = Arc::clone(provider);
            let prompt = PromptBuilder::new(chunk.clone(), language)
                .with_aggressiveness(settings.aggressiveness)
                .with_known_names(known_names.to_vec())
                .with_relationships(settings.enable_relationships)
                .build();
            let deadline = Instant::now() + settings.chunk_timeout();

            debug!("Submitting chunk {} ({} chars)", chunk_index, chunk.len());
            let handle = tokio::task::spawn_blocking(move || provider.generate(&prompt));
            handles.push((chunk_index, deadline, handle));
        }

        for (chunk_index, deadline, handle) in handles {
            let mut extraction = match timeout_at(deadline, handle).await {
                Err(_) => {
                    warn!("Chunk {} timed out; contributing empty extraction", chunk_index);
                    failed_chunks += 1;
                    ChunkExtraction::empty()
                }
                Ok(Err(join_error)) => {
                    warn!("Chunk {} task failed: {}", chunk_index, join_error);
                    failed_chunks += 1;
                    ChunkExtraction::empty()
                }
                Ok(Ok(Err(model_error))) => {
                    warn!("Chunk {} model call failed: {}", chunk_index, model_error);
                    failed_chunks += 1;
                    ChunkExtraction::empty()
                }
                Ok(Ok(Ok(response))) => match parser::parse_chunk_response(&response) {
                    Ok(extraction) => extraction,
                    Err(e) => {
                        warn!("Chunk {} returned malformed output: {}", chunk_index, e);
                        failed_chunks += 1;
                        ChunkExtraction::empty()
                    }
                },
            };

            extraction
                .entities
                .retain(|mention| mention.confidence >= settings.confidence_threshold);
            if !settings.enable_relationships {
                extraction.relationships.clear();
            }

            for mention in &extraction.entities {
                observer.on_event(ProgressEvent::Entity {
                    name: mention.name.clone(),
                    entity_type: mention.entity_type.clone(),
                });
            }

            extractions.push(extraction);
        }

        let current = extractions.len();
        observer.on_event(ProgressEvent::Extraction {
            stage: "extracting".to_string(),
            current,
            total,
            message: format!("Analyzed {} of {} sections", current, total),
        });
    }

    OrchestratorOutput {
        extractions,
        failed_chunks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NullObserver;
    use lorekeeper_llm::MockProvider;
    use std::sync::Mutex;
    use std::time::Duration;

    fn settings() -> ExtractionSettings {
        ExtractionSettings {
            parallel_batch_size: 2,
            chunk_timeout_secs: 1,
            ..Default::default()
        }
    }

    fn entity_response(name: &str, confidence: f64) -> String {
        format!(
            r#"{{"entities": [{{"name": "{}", "type": "person", "confidence": {}}}], "relationships": []}}"#,
            name, confidence
        )
    }

    /// Observer that records every event
    struct RecordingObserver {
        events: Mutex<Vec<ProgressEvent>>,
    }

    impl RecordingObserver {
        fn new() -> Self {
            Self {
                events: Mutex::new(Vec::new()),
            }
        }
    }

    impl ProgressObserver for RecordingObserver {
        fn on_event(&self, event: ProgressEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    #[tokio::test]
    async fn test_results_stay_in_chunk_order() {
        let provider = Arc::new(MockProvider::new(entity_response("Someone", 0.9)));
        let chunks: Vec<String> = (0..5).map(|i| format!("chunk {}", i)).collect();

        let output = run_batches(
            &provider,
            &chunks,
            "English",
            &[],
            &settings(),
            &NullObserver,
        )
        .await;

        assert_eq!(output.extractions.len(), 5);
        assert_eq!(output.failed_chunks, 0);
        assert_eq!(provider.call_count(), 5);
    }

    #[tokio::test]
    async fn test_malformed_chunk_degrades_to_empty() {
        let mut provider = MockProvider::new(entity_response("Fine", 0.9));
        // The prompt embeds the chunk text, so match on the full prompt
        let bad_prompt = PromptBuilder::new("bad chunk", "English").build();
        provider.add_response(bad_prompt, "not json at all");
        let provider = Arc::new(provider);

        let chunks = vec!["good chunk".to_string(), "bad chunk".to_string()];
        let output = run_batches(
            &provider,
            &chunks,
            "English",
            &[],
            &settings(),
            &NullObserver,
        )
        .await;

        assert_eq!(output.extractions.len(), 2);
        assert_eq!(output.failed_chunks, 1);
        assert!(!output.extractions[0].is_empty());
        assert!(output.extractions[1].is_empty());
    }

    #[tokio::test]
    async fn test_slow_chunk_times_out() {
        let provider = Arc::new(
            MockProvider::new(entity_response("Slow", 0.9))
                .with_delay(Duration::from_millis(300)),
        );
        let chunks = vec!["only chunk".to_string()];

        let mut fast = settings();
        fast.chunk_timeout_secs = 1;

        // 300ms delay finishes inside the 1s deadline
        let output = run_batches(&provider, &chunks, "English", &[], &fast, &NullObserver).await;
        assert_eq!(output.failed_chunks, 0);

        // 1500ms delay blows past it and degrades to empty
        let slow_provider = Arc::new(
            MockProvider::new(entity_response("Slow", 0.9))
                .with_delay(Duration::from_millis(1500)),
        );
        let output =
            run_batches(&slow_provider, &chunks, "English", &[], &fast, &NullObserver).await;

        assert_eq!(output.extractions.len(), 1);
        assert_eq!(output.failed_chunks, 1);
        assert!(output.extractions[0].is_empty());
    }

    #[tokio::test]
    async fn test_confidence_threshold_filters_entities() {
        let mut provider = MockProvider::new("{}");
        let strong_prompt = PromptBuilder::new("strong", "English").build();
        let weak_prompt = PromptBuilder::new("weak", "English").build();
        provider.add_response(strong_prompt, entity_response("Strong", 0.9));
        provider.add_response(weak_prompt, entity_response("Weak", 0.2));
        let provider = Arc::new(provider);

        let chunks = vec!["strong".to_string(), "weak".to_string()];
        let output = run_batches(
            &provider,
            &chunks,
            "English",
            &[],
            &settings(),
            &NullObserver,
        )
        .await;

        let all: Vec<_> = output
            .extractions
            .iter()
            .flat_map(|e| &e.entities)
            .collect();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "Strong");
        assert!(all.iter().all(|m| m.confidence >= 0.5));
        // Filtering is not a chunk failure
        assert_eq!(output.failed_chunks, 0);
    }

    #[tokio::test]
    async fn test_relationships_dropped_when_disabled() {
        let response = r#"{
            "entities": [{"name": "Grok", "type": "person", "confidence": 0.9}],
            "relationships": [{"source": "Grok", "target": "Vesper", "type": "climbs"}]
        }"#;
        let provider = Arc::new(MockProvider::new(response));
        let chunks = vec!["chunk".to_string()];

        let mut no_rels = settings();
        no_rels.enable_relationships = false;

        let output =
            run_batches(&provider, &chunks, "English", &[], &no_rels, &NullObserver).await;

        assert_eq!(output.extractions[0].entities.len(), 1);
        assert!(output.extractions[0].relationships.is_empty());
    }

    #[tokio::test]
    async fn test_progress_events_emitted() {
        let provider = Arc::new(MockProvider::new(entity_response("Grok", 0.9)));
        let chunks: Vec<String> = (0..3).map(|i| format!("chunk {}", i)).collect();
        let observer = RecordingObserver::new();

        run_batches(&provider, &chunks, "English", &[], &settings(), &observer).await;

        let events = observer.events.lock().unwrap();
        let entity_events = events
            .iter()
            .filter(|e| matches!(e, ProgressEvent::Entity { .. }))
            .count();
        assert_eq!(entity_events, 3);

        // Batch size 2 over 3 chunks: progress after each of 2 batches
        let batch_events: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                ProgressEvent::Extraction { current, total, .. } => Some((*current, *total)),
                _ => None,
            })
            .collect();
        assert_eq!(batch_events, vec![(2, 3), (3, 3)]);
    }
}
