//! Lorekeeper Storage Layer
//!
//! Implements the `EntityStore` trait on SQLite.
//!
//! # Architecture
//!
//! - SQLite for structured graph data (entities, relationships, documents)
//! - Alias and tag lists stored as JSON array columns
//! - `EmbeddingIndex` implements `SearchIndex` for post-commit index sync
//!
//! # Examples
//!
//! ```no_run
//! use lorekeeper_store::SqliteStore;
//!
//! let store = SqliteStore::new(":memory:").unwrap();
//! // Store is now ready for entity operations
//! ```

#![warn(missing_docs)]

pub mod embedding;
pub mod index;

use lorekeeper_domain::traits::EntityStore;
use lorekeeper_domain::{Entity, EntityId, Relationship, RelationshipId, Visibility};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use thiserror::Error;

pub use embedding::{EmbeddingError, EmbeddingModel, MockEmbeddingModel};
pub use index::EmbeddingIndex;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Entity not found
    #[error("Entity not found: {0}")]
    NotFound(String),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// An entity with the same canonical name already exists in the campaign
    #[error("An entry named '{0}' already exists in this campaign")]
    DuplicateCanonicalName(String),

    /// A relationship with the same (source, target, type) already exists
    #[error("Duplicate relationship")]
    DuplicateRelationship,
}

/// SQLite-based implementation of EntityStore
///
/// Provides persistent storage for entities, relationships, source documents,
/// and entity embeddings.
///
/// # Thread Safety
///
/// SQLite connections are not thread-safe. Each thread should have its own
/// SqliteStore instance.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Create a new SqliteStore with the given database path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use lorekeeper_store::SqliteStore;
    ///
    /// let store = SqliteStore::new("lorekeeper.db").unwrap();
    /// ```
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let mut store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn initialize_schema(&mut self) -> Result<(), StoreError> {
        let schema = include_str!("schema.sql");
        self.conn.execute_batch(schema)?;
        Ok(())
    }

    /// Convert an id's raw value to bytes for storage
    fn id_to_bytes(value: u128) -> Vec<u8> {
        value.to_be_bytes().to_vec()
    }

    /// Convert bytes back to a raw id value
    fn bytes_to_id(bytes: &[u8]) -> Result<u128, StoreError> {
        if bytes.len() != 16 {
            return Err(StoreError::InvalidData(format!(
                "Expected 16 bytes for id, got {}",
                bytes.len()
            )));
        }
        let mut arr = [0u8; 16];
        arr.copy_from_slice(bytes);
        Ok(u128::from_be_bytes(arr))
    }

    /// Serialize a string list to its JSON column form
    fn list_to_json(list: &[String]) -> Result<String, StoreError> {
        serde_json::to_string(list)
            .map_err(|e| StoreError::InvalidData(format!("Failed to serialize list: {}", e)))
    }

    /// Deserialize a JSON column back to a string list
    fn json_to_list(json: &str) -> Result<Vec<String>, StoreError> {
        serde_json::from_str(json)
            .map_err(|e| StoreError::InvalidData(format!("Failed to parse list column: {}", e)))
    }

    fn row_to_entity(row: &rusqlite::Row<'_>) -> rusqlite::Result<(Entity, String, String)> {
        let id_bytes: Vec<u8> = row.get(0)?;
        let id = Self::bytes_to_id(&id_bytes).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Blob, Box::new(e))
        })?;

        let visibility_str: String = row.get(8)?;
        let visibility = Visibility::parse(&visibility_str).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                8,
                rusqlite::types::Type::Text,
                Box::new(StoreError::InvalidData(e)),
            )
        })?;

        let aliases_json: String = row.get(6)?;
        let tags_json: String = row.get(7)?;

        let entity = Entity {
            id: EntityId::from_value(id),
            campaign_id: row.get(1)?,
            name: row.get(2)?,
            canonical_name: row.get(3)?,
            entity_type: row.get(4)?,
            content: row.get(5)?,
            aliases: Vec::new(),
            tags: Vec::new(),
            visibility,
            created_at: row.get::<_, i64>(9)? as u64,
        };

        Ok((entity, aliases_json, tags_json))
    }

    fn fill_lists(
        (mut entity, aliases_json, tags_json): (Entity, String, String),
    ) -> Result<Entity, StoreError> {
        entity.aliases = Self::json_to_list(&aliases_json)?;
        entity.tags = Self::json_to_list(&tags_json)?;
        Ok(entity)
    }

    /// List the document names recorded as sources for an entity
    pub fn list_source_references(&self, entity_id: EntityId) -> Result<Vec<String>, StoreError> {
        let id_bytes = Self::id_to_bytes(entity_id.value());
        let mut stmt = self.conn.prepare(
            "SELECT document_name FROM entity_sources WHERE entity_id = ?1 ORDER BY document_name",
        )?;
        let names = stmt
            .query_map(params![&id_bytes], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(names)
    }
}

const ENTITY_COLUMNS: &str = "id, campaign_id, name, canonical_name, entity_type, content, \
                              aliases, tags, visibility, created_at";

impl EntityStore for SqliteStore {
    type Error = StoreError;

    fn create_entity(&mut self, entity: Entity) -> Result<EntityId, Self::Error> {
        // Duplicate canonical names are rejected synchronously, before any
        // write occurs.
        let exists: bool = self
            .conn
            .query_row(
                "SELECT 1 FROM entities WHERE campaign_id = ?1 AND canonical_name = ?2",
                params![&entity.campaign_id, &entity.canonical_name],
                |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false);

        if exists {
            return Err(StoreError::DuplicateCanonicalName(entity.name));
        }

        let id_bytes = Self::id_to_bytes(entity.id.value());
        let aliases = Self::list_to_json(&entity.aliases)?;
        let tags = Self::list_to_json(&entity.tags)?;

        self.conn.execute(
            "INSERT INTO entities (id, campaign_id, name, canonical_name, entity_type, content, \
                                   aliases, tags, visibility, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                &id_bytes,
                &entity.campaign_id,
                &entity.name,
                &entity.canonical_name,
                &entity.entity_type,
                &entity.content,
                &aliases,
                &tags,
                entity.visibility.as_str(),
                entity.created_at as i64,
            ],
        )?;

        Ok(entity.id)
    }

    fn get_entity(&self, id: EntityId) -> Result<Option<Entity>, Self::Error> {
        let id_bytes = Self::id_to_bytes(id.value());

        let row = self
            .conn
            .query_row(
                &format!("SELECT {} FROM entities WHERE id = ?1", ENTITY_COLUMNS),
                params![&id_bytes],
                Self::row_to_entity,
            )
            .optional()?;

        row.map(Self::fill_lists).transpose()
    }

    fn list_entities(&self, campaign_id: &str) -> Result<Vec<Entity>, Self::Error> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM entities WHERE campaign_id = ?1 ORDER BY created_at, id",
            ENTITY_COLUMNS
        ))?;

        let rows = stmt
            .query_map(params![campaign_id], Self::row_to_entity)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(Self::fill_lists).collect()
    }

    fn append_aliases(&mut self, id: EntityId, aliases: &[String]) -> Result<(), Self::Error> {
        let entity = self
            .get_entity(id)?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        let mut merged = entity.aliases;
        for alias in aliases {
            let already_known = merged
                .iter()
                .any(|existing| existing.eq_ignore_ascii_case(alias));
            if !already_known {
                merged.push(alias.clone());
            }
        }

        let id_bytes = Self::id_to_bytes(id.value());
        let json = Self::list_to_json(&merged)?;
        self.conn.execute(
            "UPDATE entities SET aliases = ?1 WHERE id = ?2",
            params![&json, &id_bytes],
        )?;

        Ok(())
    }

    fn create_relationship(
        &mut self,
        relationship: Relationship,
    ) -> Result<RelationshipId, Self::Error> {
        let source_bytes = Self::id_to_bytes(relationship.source_entity_id.value());
        let target_bytes = Self::id_to_bytes(relationship.target_entity_id.value());

        let exists: bool = self
            .conn
            .query_row(
                "SELECT 1 FROM relationships
                 WHERE campaign_id = ?1 AND source_entity_id = ?2
                   AND target_entity_id = ?3 AND relationship_type = ?4",
                params![
                    &relationship.campaign_id,
                    &source_bytes,
                    &target_bytes,
                    &relationship.relationship_type,
                ],
                |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false);

        if exists {
            return Err(StoreError::DuplicateRelationship);
        }

        let id_bytes = Self::id_to_bytes(relationship.id.value());
        self.conn.execute(
            "INSERT INTO relationships (id, campaign_id, source_entity_id, target_entity_id, \
                                        relationship_type, reverse_label, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                &id_bytes,
                &relationship.campaign_id,
                &source_bytes,
                &target_bytes,
                &relationship.relationship_type,
                &relationship.reverse_label,
                relationship.created_at as i64,
            ],
        )?;

        Ok(relationship.id)
    }

    fn list_relationships(&self, campaign_id: &str) -> Result<Vec<Relationship>, Self::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT id, campaign_id, source_entity_id, target_entity_id, relationship_type, \
                    reverse_label, created_at
             FROM relationships WHERE campaign_id = ?1 ORDER BY created_at, id",
        )?;

        let relationships = stmt
            .query_map(params![campaign_id], |row| {
                let id_bytes: Vec<u8> = row.get(0)?;
                let source_bytes: Vec<u8> = row.get(2)?;
                let target_bytes: Vec<u8> = row.get(3)?;

                let to_id = |bytes: &[u8], col: usize| {
                    Self::bytes_to_id(bytes).map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(
                            col,
                            rusqlite::types::Type::Blob,
                            Box::new(e),
                        )
                    })
                };

                Ok(Relationship {
                    id: RelationshipId::from_value(to_id(&id_bytes, 0)?),
                    campaign_id: row.get(1)?,
                    source_entity_id: EntityId::from_value(to_id(&source_bytes, 2)?),
                    target_entity_id: EntityId::from_value(to_id(&target_bytes, 3)?),
                    relationship_type: row.get(4)?,
                    reverse_label: row.get(5)?,
                    created_at: row.get::<_, i64>(6)? as u64,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(relationships)
    }

    fn record_document(
        &mut self,
        campaign_id: &str,
        name: &str,
        content: &str,
    ) -> Result<(), Self::Error> {
        let created_at = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        self.conn.execute(
            "INSERT INTO documents (campaign_id, name, content, created_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (campaign_id, name) DO UPDATE SET
             content = excluded.content, created_at = excluded.created_at",
            params![campaign_id, name, content, created_at as i64],
        )?;

        Ok(())
    }

    fn add_source_reference(
        &mut self,
        entity_id: EntityId,
        document_name: &str,
    ) -> Result<(), Self::Error> {
        let id_bytes = Self::id_to_bytes(entity_id.value());

        self.conn.execute(
            "INSERT OR IGNORE INTO entity_sources (entity_id, document_name) VALUES (?1, ?2)",
            params![&id_bytes, document_name],
        )?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lorekeeper_domain::Entity;

    fn store() -> SqliteStore {
        SqliteStore::new(":memory:").unwrap()
    }

    fn entity(campaign: &str, name: &str) -> Entity {
        Entity::new(campaign, name, "person", 100)
    }

    #[test]
    fn test_create_and_get_entity() {
        let mut store = store();
        let mut e = entity("c1", "Grok the Bold");
        e.aliases = vec!["Grok".to_string()];
        e.tags = vec!["auto-extracted".to_string()];
        let id = store.create_entity(e).unwrap();

        let loaded = store.get_entity(id).unwrap().unwrap();
        assert_eq!(loaded.name, "Grok the Bold");
        assert_eq!(loaded.canonical_name, "grok-the-bold");
        assert_eq!(loaded.aliases, vec!["Grok"]);
        assert_eq!(loaded.tags, vec!["auto-extracted"]);
    }

    #[test]
    fn test_get_missing_entity() {
        let store = store();
        assert!(store.get_entity(EntityId::new()).unwrap().is_none());
    }

    #[test]
    fn test_duplicate_canonical_name_rejected() {
        let mut store = store();
        store.create_entity(entity("c1", "Grok the Bold")).unwrap();

        // Different casing and punctuation, same canonical form
        let result = store.create_entity(entity("c1", "grok, the bold"));
        assert!(matches!(result, Err(StoreError::DuplicateCanonicalName(_))));
    }

    #[test]
    fn test_same_canonical_name_in_other_campaign() {
        let mut store = store();
        store.create_entity(entity("c1", "Grok")).unwrap();
        // Canonical uniqueness is scoped per campaign
        assert!(store.create_entity(entity("c2", "Grok")).is_ok());
    }

    #[test]
    fn test_list_entities_scoped_to_campaign() {
        let mut store = store();
        store.create_entity(entity("c1", "Grok")).unwrap();
        store.create_entity(entity("c1", "Mount Vesper")).unwrap();
        store.create_entity(entity("c2", "Elsewhere")).unwrap();

        let listed = store.list_entities("c1").unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().all(|e| e.campaign_id == "c1"));
    }

    #[test]
    fn test_append_aliases_deduplicates() {
        let mut store = store();
        let mut e = entity("c1", "Grok");
        e.aliases = vec!["Grok the Bold".to_string()];
        let id = store.create_entity(e).unwrap();

        store
            .append_aliases(
                id,
                &["grok the bold".to_string(), "Bold One".to_string()],
            )
            .unwrap();

        let loaded = store.get_entity(id).unwrap().unwrap();
        assert_eq!(loaded.aliases, vec!["Grok the Bold", "Bold One"]);
    }

    #[test]
    fn test_append_aliases_missing_entity() {
        let mut store = store();
        let result = store.append_aliases(EntityId::new(), &["x".to_string()]);
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_create_relationship_and_list() {
        let mut store = store();
        let a = store.create_entity(entity("c1", "Grok")).unwrap();
        let b = store.create_entity(entity("c1", "Mount Vesper")).unwrap();

        let rel = Relationship::new("c1", a, b, "lives on", 100).with_reverse_label("home of");
        store.create_relationship(rel).unwrap();

        let listed = store.list_relationships("c1").unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].source_entity_id, a);
        assert_eq!(listed[0].target_entity_id, b);
        assert_eq!(listed[0].reverse_label.as_deref(), Some("home of"));
    }

    #[test]
    fn test_duplicate_relationship_rejected() {
        let mut store = store();
        let a = store.create_entity(entity("c1", "Grok")).unwrap();
        let b = store.create_entity(entity("c1", "Mount Vesper")).unwrap();

        store
            .create_relationship(Relationship::new("c1", a, b, "lives on", 100))
            .unwrap();
        let result = store.create_relationship(Relationship::new("c1", a, b, "lives on", 200));
        assert!(matches!(result, Err(StoreError::DuplicateRelationship)));

        // A different type between the same entities is fine
        assert!(store
            .create_relationship(Relationship::new("c1", a, b, "guards", 200))
            .is_ok());
    }

    #[test]
    fn test_source_references() {
        let mut store = store();
        let id = store.create_entity(entity("c1", "Grok")).unwrap();

        store.record_document("c1", "session-3.txt", "notes").unwrap();
        store.add_source_reference(id, "session-3.txt").unwrap();
        store.add_source_reference(id, "session-3.txt").unwrap();

        let refs = store.list_source_references(id).unwrap();
        assert_eq!(refs, vec!["session-3.txt"]);
    }

    #[test]
    fn test_persists_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keeper.db");

        let id = {
            let mut store = SqliteStore::new(&path).unwrap();
            store.create_entity(entity("c1", "Grok")).unwrap()
        };

        let store = SqliteStore::new(&path).unwrap();
        assert!(store.get_entity(id).unwrap().is_some());
    }
}
