//! Integration tests for the full extraction pipeline

use crate::types::{ExtractionRequest, KnownEntity, NullObserver, ProgressEvent, ProgressObserver};
use crate::{ExtractionSettings, Extractor, ExtractorError, MatchType};
use lorekeeper_llm::MockProvider;
use std::sync::Mutex;
use std::time::Duration;

const TWO_ENTITY_RESPONSE: &str = r#"{
    "entities": [
        {
            "name": "Grok the Bold",
            "type": "person",
            "aliases": ["Grok"],
            "description": "Warchief who led the crossing of Mount Vesper.",
            "confidence": 0.9
        },
        {
            "name": "Mount Vesper",
            "type": "place",
            "aliases": [],
            "description": "A grim peak in the north.",
            "confidence": 0.8
        }
    ],
    "relationships": [
        {
            "source": "Grok the Bold",
            "target": "Mount Vesper",
            "type": "crossed",
            "reverse_label": "crossed by",
            "excerpt": "Grok led the crossing of Mount Vesper."
        }
    ]
}"#;

fn request(content: &str) -> ExtractionRequest {
    ExtractionRequest {
        content: content.to_string(),
        source_label: "session-notes.txt".to_string(),
        language: "English".to_string(),
        known_entities: Vec::new(),
    }
}

fn small_chunk_settings() -> ExtractionSettings {
    ExtractionSettings {
        chunk_size: 40,
        parallel_batch_size: 2,
        ..Default::default()
    }
}

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
async fn test_end_to_end_extraction() {
    let provider = MockProvider::new(TWO_ENTITY_RESPONSE);
    let extractor = Extractor::new(provider, small_chunk_settings());

    // Two paragraphs over the 40-char budget: two chunks, identical responses
    let outcome = extractor
        .extract(
            request("The first paragraph of notes here.\n\nThe second paragraph of notes here."),
            &NullObserver,
        )
        .await
        .unwrap();

    assert_eq!(outcome.summary.chunks_total, 2);
    assert_eq!(outcome.summary.chunks_failed, 0);

    // Mentions from both chunks merged case-insensitively
    let preview = &outcome.preview;
    assert_eq!(preview.entities.len(), 2);
    assert_eq!(preview.entities[0].name, "Grok the Bold");
    assert_eq!(preview.entities[0].canonical_name, "grok-the-bold");
    assert_eq!(preview.entities[0].aliases, vec!["Grok"]);

    // The duplicate relationship mention deduped to one, endpoints resolved
    assert_eq!(preview.relationships.len(), 1);
    let rel = &preview.relationships[0];
    assert_eq!(rel.source_temp_id.as_deref(), Some("staged-1"));
    assert_eq!(rel.target_temp_id.as_deref(), Some("staged-2"));

    // Cross-links generated between the two candidates
    assert!(preview.entities[0].content.contains("[[Mount Vesper]]"));
}

#[tokio::test]
async fn test_empty_document_is_empty_outcome() {
    let provider = MockProvider::new(TWO_ENTITY_RESPONSE);
    let extractor = Extractor::new(provider, ExtractionSettings::default());

    let outcome = extractor.extract(request("   \n\n  "), &NullObserver).await.unwrap();

    assert_eq!(outcome.summary.chunks_total, 0);
    assert!(outcome.preview.entities.is_empty());
    assert!(outcome.preview.relationships.is_empty());
}

#[tokio::test]
async fn test_no_model_calls_for_empty_document() {
    let provider = MockProvider::new(TWO_ENTITY_RESPONSE);
    let call_counter = provider.clone();
    let extractor = Extractor::new(provider, ExtractionSettings::default());

    extractor.extract(request(""), &NullObserver).await.unwrap();
    assert_eq!(call_counter.call_count(), 0);
}

#[tokio::test]
async fn test_max_chunks_caps_model_calls() {
    let provider = MockProvider::new(TWO_ENTITY_RESPONSE);
    let call_counter = provider.clone();

    let settings = ExtractionSettings {
        chunk_size: 25,
        max_chunks: 2,
        ..Default::default()
    };
    let extractor = Extractor::new(provider, settings);

    let outcome = extractor
        .extract(
            request("Paragraph number one.\n\nParagraph number two.\n\nParagraph number three."),
            &NullObserver,
        )
        .await
        .unwrap();

    assert_eq!(outcome.summary.chunks_total, 2);
    assert_eq!(call_counter.call_count(), 2);
}

#[tokio::test]
async fn test_pipeline_timeout_is_terminal() {
    let provider =
        MockProvider::new(TWO_ENTITY_RESPONSE).with_delay(Duration::from_millis(1500));

    let settings = ExtractionSettings {
        pipeline_timeout_secs: 1,
        chunk_timeout_secs: 10,
        ..Default::default()
    };
    let extractor = Extractor::new(provider, settings);
    let observer = RecordingObserver::new();

    let result = extractor.extract(request("Some content."), &observer).await;

    assert!(matches!(result, Err(ExtractorError::PipelineTimeout(1))));

    // The protocol surfaced a terminal error event and no Complete event
    let events = observer.events.lock().unwrap();
    assert!(events.iter().any(|e| matches!(e, ProgressEvent::Error { .. })));
    assert!(!events.iter().any(|e| matches!(e, ProgressEvent::Complete { .. })));
}

#[tokio::test]
async fn test_per_chunk_timeout_degrades_not_fails() {
    let provider =
        MockProvider::new(TWO_ENTITY_RESPONSE).with_delay(Duration::from_millis(1500));

    let settings = ExtractionSettings {
        chunk_timeout_secs: 1,
        pipeline_timeout_secs: 10,
        ..Default::default()
    };
    let extractor = Extractor::new(provider, settings);

    let outcome = extractor
        .extract(request("Some content."), &NullObserver)
        .await
        .unwrap();

    assert_eq!(outcome.summary.chunks_total, 1);
    assert_eq!(outcome.summary.chunks_failed, 1);
    assert!(outcome.preview.entities.is_empty());
}

#[tokio::test]
async fn test_existing_entities_discarded_and_matched() {
    let response = r#"{
        "entities": [
            {"name": "Mount Vesper", "type": "place", "confidence": 0.9},
            {"name": "The Warchief", "type": "person", "aliases": ["Grok the Bold"],
             "description": "Seen near Mount Vesper.", "confidence": 0.9}
        ],
        "relationships": []
    }"#;
    let provider = MockProvider::new(response);
    let extractor = Extractor::new(provider, ExtractionSettings::default());

    let mut req = request("Notes mentioning the warchief and the mountain.");
    req.known_entities = vec![
        KnownEntity {
            id: "0192b7a0-0000-7000-8000-000000000001".to_string(),
            name: "Mount Vesper".to_string(),
            canonical_name: "mount-vesper".to_string(),
            aliases: Vec::new(),
        },
        KnownEntity {
            id: "0192b7a0-0000-7000-8000-000000000002".to_string(),
            name: "Grok the Bold".to_string(),
            canonical_name: "grok-the-bold".to_string(),
            aliases: Vec::new(),
        },
    ];

    let outcome = extractor.extract(req, &NullObserver).await.unwrap();

    // Mount Vesper already exists: not a new candidate
    assert_eq!(outcome.preview.entities.len(), 1);
    assert_eq!(outcome.preview.entities[0].name, "The Warchief");

    // But the new candidate's alias flags the likely duplicate
    assert_eq!(outcome.preview.matches.len(), 1);
    let entity_match = &outcome.preview.matches[0];
    assert_eq!(entity_match.match_type, MatchType::Alias);
    assert_eq!(entity_match.confidence, 0.8);
    assert_eq!(entity_match.entity_name, "Grok the Bold");

    // The existing name still participates in cross-linking
    assert!(outcome.preview.entities[0].content.contains("[[Mount Vesper]]"));
}

#[tokio::test]
async fn test_confidence_threshold_respected_in_preview() {
    let response = r#"{
        "entities": [
            {"name": "Strong", "type": "person", "confidence": 0.9},
            {"name": "Weak", "type": "person", "confidence": 0.3}
        ],
        "relationships": []
    }"#;
    let provider = MockProvider::new(response);

    let settings = ExtractionSettings {
        confidence_threshold: 0.5,
        ..Default::default()
    };
    let extractor = Extractor::new(provider, settings);

    let outcome = extractor
        .extract(request("Some content."), &NullObserver)
        .await
        .unwrap();

    assert_eq!(outcome.preview.entities.len(), 1);
    assert!(outcome
        .preview
        .entities
        .iter()
        .all(|e| e.confidence >= 0.5));
}

#[tokio::test]
async fn test_invalid_settings_rejected() {
    let provider = MockProvider::default();
    let settings = ExtractionSettings {
        chunk_size: 0,
        ..Default::default()
    };
    let extractor = Extractor::new(provider, settings);

    let result = extractor.extract(request("content"), &NullObserver).await;
    assert!(matches!(result, Err(ExtractorError::InvalidSettings(_))));
}

#[tokio::test]
async fn test_complete_event_carries_preview() {
    let provider = MockProvider::new(TWO_ENTITY_RESPONSE);
    let extractor = Extractor::new(provider, ExtractionSettings::default());
    let observer = RecordingObserver::new();

    extractor
        .extract(request("Grok crossed the mountain."), &observer)
        .await
        .unwrap();

    let events = observer.events.lock().unwrap();
    let preview = events
        .iter()
        .find_map(|e| match e {
            ProgressEvent::Complete { preview } => Some(preview),
            _ => None,
        })
        .expect("complete event missing");

    assert_eq!(preview.entities.len(), 2);
    assert_eq!(preview.relationships.len(), 1);

    // Entity discovery events streamed before completion
    let entity_events = events
        .iter()
        .filter(|e| matches!(e, ProgressEvent::Entity { .. }))
        .count();
    assert_eq!(entity_events, 2);
}
