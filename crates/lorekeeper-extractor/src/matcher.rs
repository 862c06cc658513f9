//! Existing-entity matching
//!
//! Advisory only: a match never blocks staging, it annotates a candidate so
//! the reviewer can choose to merge into the persisted entity instead of
//! creating a duplicate.

use crate::types::{ExtractedEntity, KnownEntity};
use lorekeeper_domain::canonicalize;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// How a candidate matched a persisted entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    /// Canonical names are identical
    Exact,

    /// One of the candidate's aliases canonicalizes to the persisted name
    Alias,
}

/// A link between a candidate and a persisted entity it likely duplicates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityMatch {
    /// Temp id of the staged candidate
    pub temp_id: String,

    /// Persisted entity id (UUID string)
    pub entity_id: String,

    /// Persisted entity name, for display
    pub entity_name: String,

    /// How the match was found
    pub match_type: MatchType,

    /// 1.0 for exact canonical matches, 0.8 for alias matches
    pub confidence: f64,
}

/// Compare candidates against the campaign's persisted entities
///
/// An exact canonical match wins outright; otherwise the first alias whose
/// canonical form hits the lookup is recorded (one match per candidate at
/// most). Candidates with no match produce no record.
pub fn find_existing_matches(
    candidates: &[ExtractedEntity],
    known_entities: &[KnownEntity],
) -> Vec<EntityMatch> {
    let lookup: HashMap<&str, &KnownEntity> = known_entities
        .iter()
        .map(|k| (k.canonical_name.as_str(), k))
        .collect();

    let mut matches = Vec::new();

    for candidate in candidates {
        if let Some(known) = lookup.get(candidate.canonical_name.as_str()) {
            matches.push(EntityMatch {
                temp_id: candidate.temp_id.clone(),
                entity_id: known.id.clone(),
                entity_name: known.name.clone(),
                match_type: MatchType::Exact,
                confidence: 1.0,
            });
            continue;
        }

        for alias in &candidate.aliases {
            if let Some(known) = lookup.get(canonicalize(alias).as_str()) {
                matches.push(EntityMatch {
                    temp_id: candidate.temp_id.clone(),
                    entity_id: known.id.clone(),
                    entity_name: known.name.clone(),
                    match_type: MatchType::Alias,
                    confidence: 0.8,
                });
                break;
            }
        }
    }

    matches
}
