//! Search index synchronization
//!
//! `EmbeddingIndex` implements the `SearchIndex` trait: it embeds an entity's
//! name and content and writes the vector to the `entity_embeddings` table.
//! Commit spawns one indexing task per created entity, so the index holds its
//! own connection behind a mutex rather than sharing the store's.

use crate::embedding::{EmbeddingModel, MockEmbeddingModel};
use crate::StoreError;
use lorekeeper_domain::traits::SearchIndex;
use lorekeeper_domain::{Entity, EntityId};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;

/// SQLite-backed embedding index
///
/// Shares the database file with `SqliteStore` but opens its own connection;
/// `SearchIndex::index_entity` takes `&self`, so indexing tasks can run from
/// multiple blocking threads over one shared index.
pub struct EmbeddingIndex {
    conn: Mutex<Connection>,
    model: MockEmbeddingModel,
}

impl EmbeddingIndex {
    /// Open the index against the given database path
    ///
    /// The `entity_embeddings` table is created by `SqliteStore::new`, so
    /// open the store first when pointing both at a fresh file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Ok(Self {
            conn: Mutex::new(conn),
            model: MockEmbeddingModel::default(),
        })
    }

    /// Replace the default embedding model
    pub fn with_model(mut self, model: MockEmbeddingModel) -> Self {
        self.model = model;
        self
    }

    /// Fetch the stored embedding for an entity, if any
    pub fn embedding(&self, entity_id: EntityId) -> Result<Option<Vec<f32>>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let id_bytes = entity_id.value().to_be_bytes().to_vec();

        let blob: Option<Vec<u8>> = conn
            .query_row(
                "SELECT vector FROM entity_embeddings WHERE entity_id = ?1",
                params![&id_bytes],
                |row| row.get(0),
            )
            .optional()?;

        Ok(blob.map(|bytes| {
            bytes
                .chunks_exact(4)
                .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect()
        }))
    }
}

impl SearchIndex for EmbeddingIndex {
    type Error = StoreError;

    fn index_entity(&self, entity: &Entity) -> Result<(), Self::Error> {
        let text = format!("{}\n{}", entity.name, entity.content);
        let vector = self
            .model
            .embed(&text)
            .map_err(|e| StoreError::InvalidData(format!("Embedding failed: {}", e)))?;

        let mut bytes = Vec::with_capacity(vector.len() * 4);
        for value in &vector {
            bytes.extend_from_slice(&value.to_le_bytes());
        }

        let updated_at = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        let conn = self.conn.lock().unwrap();
        let id_bytes = entity.id.value().to_be_bytes().to_vec();
        conn.execute(
            "INSERT INTO entity_embeddings (entity_id, dimension, vector, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (entity_id) DO UPDATE SET
             dimension = excluded.dimension, vector = excluded.vector,
             updated_at = excluded.updated_at",
            params![&id_bytes, vector.len() as i64, &bytes, updated_at as i64],
        )?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SqliteStore;
    use lorekeeper_domain::traits::EntityStore;

    #[test]
    fn test_index_entity_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keeper.db");

        let mut store = SqliteStore::new(&path).unwrap();
        let mut entity = Entity::new("c1", "Grok the Bold", "person", 100);
        entity.content = "Warchief of the Ashen Court.".to_string();
        store.create_entity(entity.clone()).unwrap();

        let index = EmbeddingIndex::open(&path).unwrap();
        index.index_entity(&entity).unwrap();

        let vector = index.embedding(entity.id).unwrap().unwrap();
        assert_eq!(vector.len(), 384);

        let magnitude: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((magnitude - 1.0).abs() < 0.0001);
    }

    #[test]
    fn test_reindex_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keeper.db");

        let mut store = SqliteStore::new(&path).unwrap();
        let mut entity = Entity::new("c1", "Grok", "person", 100);
        entity.content = "First draft.".to_string();
        store.create_entity(entity.clone()).unwrap();

        let index = EmbeddingIndex::open(&path).unwrap();
        index.index_entity(&entity).unwrap();
        let first = index.embedding(entity.id).unwrap().unwrap();

        entity.content = "Revised after review.".to_string();
        index.index_entity(&entity).unwrap();
        let second = index.embedding(entity.id).unwrap().unwrap();

        assert_ne!(first, second);
    }

    #[test]
    fn test_missing_embedding() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keeper.db");
        let _store = SqliteStore::new(&path).unwrap();

        let index = EmbeddingIndex::open(&path).unwrap();
        assert!(index.embedding(EntityId::new()).unwrap().is_none());
    }
}
