//! Embedding Model for Entity Text Vectorization
//!
//! Text-to-vector conversion backing the post-commit search index. Embeddings
//! let downstream consumers (semantic search, "related entries") find entities
//! by meaning rather than name.
//!
//! The default model is a mock: hash-based, deterministic, unit-normalized.
//! It exercises the whole index-sync path without large model files; a real
//! ONNX model can slot in behind the same trait later.
//!
//! # Examples
//!
//! ```rust
//! use lorekeeper_store::embedding::{MockEmbeddingModel, EmbeddingModel};
//!
//! let model = MockEmbeddingModel::new(384);
//! let embedding = model.embed("Grok the Bold, warchief of the Ashen Court").unwrap();
//! assert_eq!(embedding.len(), 384);
//!
//! // Same text always produces same embedding
//! let again = model.embed("Grok the Bold, warchief of the Ashen Court").unwrap();
//! assert_eq!(embedding, again);
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use thiserror::Error;

/// Errors that can occur during embedding generation
#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// Invalid input text
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Model inference error
    #[error("Model inference failed: {0}")]
    InferenceFailed(String),
}

/// Trait for embedding models
pub trait EmbeddingModel {
    /// Generate an embedding vector for the given text
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Get the dimension of embeddings produced by this model
    fn dimension(&self) -> usize;
}

/// Hash-based deterministic embedding model
///
/// Generated vectors are:
///
/// - **Deterministic**: same text always produces the same embedding
/// - **Normalized**: unit length, ready for cosine similarity
/// - **Diverse**: different texts produce different embeddings
pub struct MockEmbeddingModel {
    dimension: usize,
}

impl MockEmbeddingModel {
    /// Create a new mock embedding model
    ///
    /// # Parameters
    ///
    /// - `dimension`: the embedding dimension (e.g., 384 for bge-small)
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    /// Hash text with a seed to get a deterministic f32 value
    fn hash_with_seed(text: &str, seed: u64) -> f32 {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        seed.hash(&mut hasher);
        let hash_value = hasher.finish();

        // Convert hash to float in range [-1, 1]
        let normalized = (hash_value as f64 / u64::MAX as f64) * 2.0 - 1.0;
        normalized as f32
    }
}

impl Default for MockEmbeddingModel {
    fn default() -> Self {
        Self::new(384)
    }
}

impl EmbeddingModel for MockEmbeddingModel {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if text.is_empty() {
            return Err(EmbeddingError::InvalidInput(
                "Empty text cannot be embedded".to_string(),
            ));
        }

        let mut embedding = Vec::with_capacity(self.dimension);
        for i in 0..self.dimension {
            embedding.push(Self::hash_with_seed(text, i as u64));
        }

        // Normalize to unit length for cosine similarity
        let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for value in &mut embedding {
                *value /= magnitude;
            }
        }

        Ok(embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
