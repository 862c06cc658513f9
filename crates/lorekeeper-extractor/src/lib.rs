//! Lorekeeper Extractor
//!
//! Converts long-form unstructured text (uploaded documents, session notes,
//! wiki entries) into a reviewable set of typed entity and relationship
//! candidates, cross-referenced via inline wiki-style links.
//!
//! # Architecture
//!
//! ```text
//! Text -> Chunker -> Orchestrator (-> model, N calls) -> Merger -> Matcher -> Preview
//! ```
//!
//! # Key Features
//!
//! - **Natural-boundary chunking**: paragraph-first, sentence fallback
//! - **Bounded concurrency**: chunk calls run in batches, each racing its own
//!   timeout; a bad chunk degrades to an empty result instead of failing the run
//! - **Cross-chunk merge**: case-insensitive mention dedup, alias union,
//!   `[[Name]]` cross-link generation
//! - **Existing-entity matching**: advisory duplicate flags for the reviewer
//! - **Streaming progress**: entity-by-entity events for interactive uploads
//!
//! # Example Usage
//!
//! ```no_run
//! use lorekeeper_extractor::{
//!     ExtractionRequest, ExtractionSettings, Extractor, NullObserver,
//! };
//! use lorekeeper_llm::MockProvider;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = MockProvider::default();
//! let extractor = Extractor::new(provider, ExtractionSettings::default());
//!
//! let request = ExtractionRequest {
//!     content: "Grok the Bold led the Ashen Court across Mount Vesper.".to_string(),
//!     source_label: "session-3.txt".to_string(),
//!     language: "English".to_string(),
//!     known_entities: Vec::new(),
//! };
//!
//! let outcome = extractor.extract(request, &NullObserver).await?;
//! println!(
//!     "{} entities, {} relationships",
//!     outcome.summary.entities_found, outcome.summary.relationships_found
//! );
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod chunking;
mod config;
mod error;
mod extractor;
mod matcher;
mod merger;
mod orchestrator;
mod parser;
mod prompt;
mod types;

#[cfg(test)]
mod tests;

pub use chunking::TextChunker;
pub use config::{Aggressiveness, ExtractionSettings, SettingsOverrides};
pub use error::ExtractorError;
pub use extractor::Extractor;
pub use matcher::{find_existing_matches, EntityMatch, MatchType};
pub use merger::{merge_extractions, MergedExtraction};
pub use prompt::PromptBuilder;
pub use types::{
    ChunkExtraction, EntityMention, ExtractPreview, ExtractedEntity, ExtractedRelationship,
    ExtractionOutcome, ExtractionRequest, ExtractionSummary, KnownEntity, NullObserver,
    ProgressEvent, ProgressObserver, RelationshipMention,
};
