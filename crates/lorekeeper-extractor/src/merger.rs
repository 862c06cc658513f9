//! Cross-chunk merge and content generation
//!
//! Per-chunk extractions are combined into one deduplicated candidate set:
//! mentions of the same name (case-insensitive) merge, mentions of names the
//! campaign already knows are discarded, relationships dedup on their
//! (source, type, target) triple, and every surviving candidate gets
//! generated wiki content with `[[Name]]` cross-links plus Connections /
//! Mentioned By sections.
//!
//! Cross-link substitution runs longest-name-first so a name that is a
//! substring of another ("Grok" inside "Grok the Bold") can never split the
//! longer link into nested markers.

use crate::types::{ChunkExtraction, ExtractedEntity, ExtractedRelationship, RelationshipMention};
use lorekeeper_domain::canonicalize;
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap, HashSet};

/// The merger's output: candidates plus deduplicated relationships
#[derive(Debug, Clone)]
pub struct MergedExtraction {
    /// Candidate entities in first-mention order
    pub entities: Vec<ExtractedEntity>,

    /// Deduplicated relationships in first-mention order
    pub relationships: Vec<ExtractedRelationship>,
}

/// One name's accumulated mentions across chunks
struct MergedMention {
    name: String,
    entity_type: String,
    aliases: Vec<String>,
    description: String,
    confidence: f64,
}

/// Merge per-chunk extractions into a deduplicated candidate set
///
/// `existing_names` are names already persisted in the target campaign:
/// mentions matching one (case-insensitively or canonically) are not new
/// entities and are discarded, but the names still participate in
/// cross-linking.
pub fn merge_extractions(
    extractions: &[ChunkExtraction],
    existing_names: &[String],
) -> MergedExtraction {
    let mut existing_keys = HashSet::new();
    for name in existing_names {
        existing_keys.insert(name.to_lowercase());
        existing_keys.insert(canonicalize(name));
    }

    // 1+2: merge mentions by lowercase name, first occurrence fixing the
    // display casing and type
    let mut order: Vec<String> = Vec::new();
    let mut merged: HashMap<String, MergedMention> = HashMap::new();

    for extraction in extractions {
        for mention in &extraction.entities {
            let key = mention.name.to_lowercase();
            if existing_keys.contains(&key) || existing_keys.contains(&canonicalize(&mention.name))
            {
                continue;
            }

            match merged.entry(key) {
                Entry::Occupied(mut occupied) => {
                    let accumulated = occupied.get_mut();
                    for alias in &mention.aliases {
                        let known = accumulated
                            .aliases
                            .iter()
                            .any(|a| a.eq_ignore_ascii_case(alias));
                        if !known {
                            accumulated.aliases.push(alias.clone());
                        }
                    }
                    // New text is appended only when it is not already a
                    // substring of what we have
                    if !mention.description.is_empty()
                        && !accumulated.description.contains(&mention.description)
                    {
                        if !accumulated.description.is_empty() {
                            accumulated.description.push_str("\n\n");
                        }
                        accumulated.description.push_str(&mention.description);
                    }
                    accumulated.confidence = accumulated.confidence.max(mention.confidence);
                }
                Entry::Vacant(vacant) => {
                    order.push(vacant.key().clone());
                    vacant.insert(MergedMention {
                        name: mention.name.clone(),
                        entity_type: mention.entity_type.clone(),
                        aliases: mention.aliases.clone(),
                        description: mention.description.clone(),
                        confidence: mention.confidence,
                    });
                }
            }
        }
    }

    // 3: dedup relationships on the (source, type, target) triple;
    // first occurrence wins, later excerpts are discarded
    let mut seen_triples = HashSet::new();
    let mut relationships: Vec<&RelationshipMention> = Vec::new();
    for extraction in extractions {
        for rel in &extraction.relationships {
            let triple = (
                rel.source.to_lowercase(),
                rel.relationship_type.clone(),
                rel.target.to_lowercase(),
            );
            if seen_triples.insert(triple) {
                relationships.push(rel);
            }
        }
    }

    // Temp ids are assigned in first-mention order so output is deterministic
    let temp_ids: HashMap<&str, String> = order
        .iter()
        .enumerate()
        .map(|(i, key)| (key.as_str(), format!("staged-{}", i + 1)))
        .collect();

    // 5: names participating in cross-linking, longest first
    let mut link_names: Vec<String> = order
        .iter()
        .map(|key| merged[key].name.clone())
        .chain(existing_names.iter().cloned())
        .collect();
    link_names.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then(a.cmp(b)));

    let entities = order
        .iter()
        .map(|key| {
            let mention = &merged[key];

            // 4: partition this entity's relationships, grouped by type
            let mut outgoing: BTreeMap<&str, Vec<&RelationshipMention>> = BTreeMap::new();
            let mut incoming: BTreeMap<&str, Vec<&RelationshipMention>> = BTreeMap::new();
            for &rel in &relationships {
                if rel.source.to_lowercase() == *key {
                    outgoing
                        .entry(rel.relationship_type.as_str())
                        .or_default()
                        .push(rel);
                }
                if rel.target.to_lowercase() == *key {
                    incoming
                        .entry(rel.relationship_type.as_str())
                        .or_default()
                        .push(rel);
                }
            }

            let others: Vec<&str> = link_names
                .iter()
                .map(String::as_str)
                .filter(|n| !n.eq_ignore_ascii_case(&mention.name))
                .collect();
            let content = render_content(mention, &outgoing, &incoming, &others);

            let mut tags = vec!["auto-extracted".to_string()];
            let type_tag = canonicalize(&mention.entity_type);
            if !type_tag.is_empty() {
                tags.push(type_tag);
            }

            ExtractedEntity {
                temp_id: temp_ids[key.as_str()].clone(),
                name: mention.name.clone(),
                canonical_name: canonicalize(&mention.name),
                entity_type: mention.entity_type.clone(),
                aliases: mention.aliases.clone(),
                tags,
                content,
                confidence: mention.confidence,
            }
        })
        .collect();

    let relationships = relationships
        .into_iter()
        .map(|rel| ExtractedRelationship {
            source_name: rel.source.clone(),
            target_name: rel.target.clone(),
            source_temp_id: temp_ids.get(rel.source.to_lowercase().as_str()).cloned(),
            target_temp_id: temp_ids.get(rel.target.to_lowercase().as_str()).cloned(),
            relationship_type: rel.relationship_type.clone(),
            reverse_label: rel.reverse_label.clone(),
            excerpt: rel.excerpt.clone(),
        })
        .collect();

    MergedExtraction {
        entities,
        relationships,
    }
}

/// Render one candidate's wiki content
fn render_content(
    mention: &MergedMention,
    outgoing: &BTreeMap<&str, Vec<&RelationshipMention>>,
    incoming: &BTreeMap<&str, Vec<&RelationshipMention>>,
    link_names: &[&str],
) -> String {
    let mut content = link_all(&mention.description, link_names);

    if !outgoing.is_empty() {
        content.push_str("\n\n## Connections\n");
        for (&rel_type, rels) in outgoing {
            let targets: Vec<String> = rels.iter().map(|r| format!("[[{}]]", r.target)).collect();
            content.push_str(&format!("- **{}**: {}\n", rel_type, targets.join(", ")));
        }
    }

    if !incoming.is_empty() {
        content.push_str("\n\n## Mentioned By\n");
        for (&rel_type, rels) in incoming {
            for rel in rels {
                let label = rel.reverse_label.as_deref().unwrap_or(rel_type);
                content.push_str(&format!("- [[{}]] ({})\n", rel.source, label));
            }
        }
    }

    content.trim().to_string()
}

/// Substitute `[[Name]]` markers for every given name, in the given order
fn link_all(text: &str, names: &[&str]) -> String {
    let mut chars: Vec<char> = text.chars().collect();
    for name in names {
        chars = link_one(&chars, name);
    }
    chars.into_iter().collect()
}

/// Substitute markers for one name: whole-word, case-insensitive, skipping
/// occurrences already inside a marker
fn link_one(chars: &[char], name: &str) -> Vec<char> {
    let needle: Vec<char> = name.chars().collect();
    if needle.is_empty() {
        return chars.to_vec();
    }

    let mut out: Vec<char> = Vec::with_capacity(chars.len());
    let mut i = 0;
    while i < chars.len() {
        if matches_at(chars, &needle, i)
            && is_word_boundary(chars, i, i + needle.len())
            && !inside_marker(chars, i + needle.len())
        {
            out.push('[');
            out.push('[');
            out.extend_from_slice(&chars[i..i + needle.len()]);
            out.push(']');
            out.push(']');
            i += needle.len();
        } else {
            out.push(chars[i]);
            i += 1;
        }
    }
    out
}

fn matches_at(chars: &[char], needle: &[char], at: usize) -> bool {
    at + needle.len() <= chars.len()
        && chars[at..at + needle.len()]
            .iter()
            .zip(needle)
            .all(|(a, b)| a.to_lowercase().eq(b.to_lowercase()))
}

fn is_word_boundary(chars: &[char], start: usize, end: usize) -> bool {
    let before_ok = start == 0 || !chars[start - 1].is_alphanumeric();
    let after_ok = end >= chars.len() || !chars[end].is_alphanumeric();
    before_ok && after_ok
}

/// Lookahead on the closing marker: an occurrence followed by `]]` before any
/// `[[` is already inside a link
fn inside_marker(chars: &[char], from: usize) -> bool {
    let mut i = from;
    while i + 1 < chars.len() {
        if chars[i] == ']' && chars[i + 1] == ']' {
            return true;
        }
        if chars[i] == '[' && chars[i + 1] == '[' {
            return false;
        }
        i += 1;
    }
    false
}
