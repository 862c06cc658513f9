//! Entity module - the nodes of a campaign knowledge graph

use crate::canonical::canonicalize;
use std::fmt;

/// Unique identifier for an entity based on UUIDv7
///
/// UUIDv7 provides:
/// - Chronological sortability (useful for "recently added" views)
/// - 128-bit uniqueness without coordination
/// - RFC 9562-standard format with broad ecosystem support
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(u128);

impl EntityId {
    /// Generate a new UUIDv7-based EntityId
    ///
    /// # Examples
    ///
    /// ```
    /// use lorekeeper_domain::EntityId;
    ///
    /// let id = EntityId::new();
    /// assert!(id.value() > 0);
    /// ```
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().as_u128())
    }

    /// Create an EntityId from a raw u128 value
    ///
    /// This is primarily for storage layer deserialization.
    pub fn from_value(value: u128) -> Self {
        Self(value)
    }

    /// Parse an EntityId from its UUID string form
    ///
    /// # Examples
    ///
    /// ```
    /// use lorekeeper_domain::EntityId;
    ///
    /// let id = EntityId::new();
    /// let parsed = EntityId::from_string(&id.to_string()).unwrap();
    /// assert_eq!(id, parsed);
    /// ```
    pub fn from_string(s: &str) -> Result<Self, String> {
        uuid::Uuid::parse_str(s)
            .map(|u| Self(u.as_u128()))
            .map_err(|e| format!("Invalid entity id: {}", e))
    }

    /// Get the raw u128 value
    pub fn value(&self) -> u128 {
        self.0
    }

    /// Get the timestamp component of the UUIDv7 (milliseconds since Unix epoch)
    pub fn timestamp(&self) -> u64 {
        // UUIDv7: top 48 bits are Unix millisecond timestamp
        (self.0 >> 80) as u64
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_u128(self.0))
    }
}

/// Whether an entity is visible to players or restricted to the DM
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    /// Visible to every member of the campaign
    Public,

    /// Visible only in DM views; excluded from player-facing graphs
    DmOnly,
}

impl Visibility {
    /// Stable string form used by the storage layer
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::DmOnly => "dm_only",
        }
    }

    /// Parse the storage string form
    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "public" => Ok(Visibility::Public),
            "dm_only" => Ok(Visibility::DmOnly),
            other => Err(format!("Unknown visibility: {}", other)),
        }
    }
}

impl Default for Visibility {
    fn default() -> Self {
        Visibility::Public
    }
}

/// A persisted entity - one node of a campaign's knowledge graph
///
/// `entity_type` is an open string tag, not a closed enum: the extraction
/// model is free to invent new types ("ghost ship", "prophecy"), and any
/// type-specific presentation is a lookup-with-fallback over this string.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    /// Unique identifier
    pub id: EntityId,

    /// Campaign (workspace) this entity belongs to
    pub campaign_id: String,

    /// Display name, original casing preserved
    pub name: String,

    /// Canonical form of `name`; unique within the campaign
    pub canonical_name: String,

    /// Open-ended type tag ("person", "place", "faction", ...)
    pub entity_type: String,

    /// Wiki content in markdown, with `[[Name]]` cross-link markers
    pub content: String,

    /// Alternative names this entity is known by
    pub aliases: Vec<String>,

    /// Free-form tags
    pub tags: Vec<String>,

    /// Player-facing or DM-only
    pub visibility: Visibility,

    /// When this entity was created (Unix seconds)
    pub created_at: u64,
}

impl Entity {
    /// Create a new entity with a freshly derived canonical name
    pub fn new(
        campaign_id: impl Into<String>,
        name: impl Into<String>,
        entity_type: impl Into<String>,
        created_at: u64,
    ) -> Self {
        let name = name.into();
        let canonical_name = canonicalize(&name);
        Self {
            id: EntityId::new(),
            campaign_id: campaign_id.into(),
            name,
            canonical_name,
            entity_type: entity_type.into(),
            content: String::new(),
            aliases: Vec::new(),
            tags: Vec::new(),
            visibility: Visibility::default(),
            created_at,
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: UUIDv7 ordering matches u128 ordering
        #[test]
        fn test_id_ordering_property(a: u128, b: u128) {
            let id_a = EntityId::from_value(a);
            let id_b = EntityId::from_value(b);

            prop_assert_eq!(id_a < id_b, a < b);
            prop_assert_eq!(id_a == id_b, a == b);
            prop_assert_eq!(id_a > id_b, a > b);
        }

        /// Property: round-trip through string representation preserves the id
        #[test]
        fn test_id_string_roundtrip(value: u128) {
            let id = EntityId::from_value(value);
            let id_str = id.to_string();

            match EntityId::from_string(&id_str) {
                Ok(parsed) => prop_assert_eq!(id, parsed),
                Err(e) => return Err(TestCaseError::fail(e)),
            }
        }
    }
}
