//! Parse model output into a chunk extraction

use crate::error::ExtractorError;
use crate::types::{ChunkExtraction, EntityMention, RelationshipMention};
use serde_json::Value;
use tracing::warn;

/// Parse a model JSON response into a chunk extraction
///
/// Individually malformed entities or relationships are skipped with a
/// warning; only an unusable response as a whole is an error (which the
/// orchestrator then degrades to an empty extraction).
pub fn parse_chunk_response(response: &str) -> Result<ChunkExtraction, ExtractorError> {
    // Models sometimes wrap JSON in markdown code blocks despite instructions
    let json_str = extract_json(response)?;

    let json: Value = serde_json::from_str(&json_str)
        .map_err(|e| ExtractorError::InvalidResponse(format!("JSON parse error: {}", e)))?;

    let obj = json
        .as_object()
        .ok_or_else(|| ExtractorError::InvalidResponse("Expected JSON object".to_string()))?;

    let mut entities = Vec::new();
    if let Some(raw_entities) = obj.get("entities").and_then(|v| v.as_array()) {
        for (idx, entity_json) in raw_entities.iter().enumerate() {
            match parse_entity_json(entity_json) {
                Ok(mention) => entities.push(mention),
                Err(e) => warn!("Skipping entity {}: {}", idx, e),
            }
        }
    }

    let mut relationships = Vec::new();
    if let Some(raw_relationships) = obj.get("relationships").and_then(|v| v.as_array()) {
        for (idx, rel_json) in raw_relationships.iter().enumerate() {
            match parse_relationship_json(rel_json) {
                Ok(mention) => relationships.push(mention),
                Err(e) => warn!("Skipping relationship {}: {}", idx, e),
            }
        }
    }

    Ok(ChunkExtraction {
        entities,
        relationships,
    })
}

/// Extract JSON from a response, handling markdown code blocks
fn extract_json(response: &str) -> Result<String, ExtractorError> {
    let trimmed = response.trim();

    if trimmed.starts_with("```") {
        let lines: Vec<&str> = trimmed.lines().collect();
        if lines.len() < 2 {
            return Err(ExtractorError::InvalidResponse(
                "Empty code block".to_string(),
            ));
        }

        // Skip first line (```json or ```) and last line (```)
        let json_lines = &lines[1..lines.len().saturating_sub(1)];
        Ok(json_lines.join("\n"))
    } else {
        Ok(trimmed.to_string())
    }
}

/// Parse a single entity mention from JSON
fn parse_entity_json(json: &Value) -> Result<EntityMention, String> {
    let obj = json
        .as_object()
        .ok_or_else(|| "Entity is not a JSON object".to_string())?;

    let name = obj
        .get("name")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| "Missing or empty 'name'".to_string())?
        .to_string();

    let entity_type = obj
        .get("type")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("unknown")
        .to_string();

    let aliases = obj
        .get("aliases")
        .and_then(|v| v.as_array())
        .map(|list| {
            list.iter()
                .filter_map(|v| v.as_str())
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();

    let description = obj
        .get("description")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .trim()
        .to_string();

    // Confidence is always clamped to [0, 1] before any filtering happens
    let confidence = obj
        .get("confidence")
        .and_then(|v| v.as_f64())
        .unwrap_or(0.5)
        .clamp(0.0, 1.0);

    Ok(EntityMention {
        name,
        entity_type,
        aliases,
        description,
        confidence,
    })
}

/// Parse a single relationship mention from JSON
fn parse_relationship_json(json: &Value) -> Result<RelationshipMention, String> {
    let obj = json
        .as_object()
        .ok_or_else(|| "Relationship is not a JSON object".to_string())?;

    let field = |key: &str| {
        obj.get(key)
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .ok_or_else(|| format!("Missing or empty '{}'", key))
    };

    let source = field("source")?;
    let target = field("target")?;
    let relationship_type = field("type")?;

    let reverse_label = obj
        .get("reverse_label")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from);

    let excerpt = obj
        .get("excerpt")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .trim()
        .to_string();

    Ok(RelationshipMention {
        source,
        target,
        relationship_type,
        reverse_label,
        excerpt,
    })
}
