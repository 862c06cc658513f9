//! Lorekeeper Domain Layer
//!
//! This crate contains the core domain model for Lorekeeper's campaign
//! knowledge graph. It has no infrastructure dependencies and defines the
//! fundamental concepts, value objects, and trait interfaces that all other
//! layers depend upon.
//!
//! ## Key Concepts
//!
//! - **Entity**: a named thing in a campaign (person, place, item, faction, ...)
//!   with an open-ended type tag and a wiki-style content body
//! - **Canonical name**: a normalized, lowercase, separator-collapsed form of
//!   an entity name used for uniqueness and matching within a campaign
//! - **Relationship**: a typed, directed edge between two entities, with an
//!   optional reverse label for backward traversal
//! - **Visibility**: whether an entity is shown to players or kept DM-only
//!
//! ## Architecture
//!
//! This crate follows Clean Architecture:
//! - No infrastructure crate dependencies
//! - Pure business logic only
//! - Storage, LLM, and index implementations live in other crates
//! - Trait definitions for all external interactions

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod canonical;
pub mod entity;
pub mod relationship;
pub mod traits;

// Re-exports for convenience
pub use canonical::canonicalize;
pub use entity::{Entity, EntityId, Visibility};
pub use relationship::{Relationship, RelationshipId};
