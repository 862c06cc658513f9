//! Lorekeeper Graph Assembler
//!
//! Builds filtered, optionally depth-limited subgraphs from persisted
//! entities and relationships for visualization. Pure and synchronous: the
//! assembler never touches storage, it maps one campaign's data plus a filter
//! to a node/link payload and per-type counts for filter UIs.
//!
//! Filtering order: visibility and type filters first, then relationships
//! with a filtered endpoint are dropped, then (when a center is given) a
//! breadth-first expansion over the surviving relationships as an undirected
//! adjacency limits the graph to `depth` hops.

#![warn(missing_docs)]

use lorekeeper_domain::{canonicalize, Entity, EntityId, Relationship, Visibility};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Numeric display groups per entity type, for node coloring
///
/// Entity types are open strings, so this is a lookup with a fallback,
/// not an enum match.
const TYPE_GROUPS: &[(&str, u32)] = &[
    ("person", 1),
    ("npc", 1),
    ("character", 1),
    ("place", 2),
    ("location", 2),
    ("region", 2),
    ("item", 3),
    ("artifact", 3),
    ("faction", 4),
    ("organization", 4),
    ("guild", 4),
    ("event", 5),
    ("creature", 6),
    ("monster", 6),
    ("deity", 7),
    ("concept", 8),
];

/// Display group for an entity type; unknown types fall back to 0
pub fn type_group(entity_type: &str) -> u32 {
    let canonical = canonicalize(entity_type);
    TYPE_GROUPS
        .iter()
        .find(|(t, _)| *t == canonical)
        .map(|(_, group)| *group)
        .unwrap_or(0)
}

/// Graph query parameters
#[derive(Debug, Clone)]
pub struct GraphFilter {
    /// Only include entities of this type (compared canonically)
    pub entity_type: Option<String>,

    /// Center the graph on this entity and expand outward
    pub center: Option<EntityId>,

    /// Hop depth for centered graphs; 0 returns only the center
    pub depth: usize,

    /// Whether DM-only entities are included
    pub include_hidden: bool,
}

impl Default for GraphFilter {
    fn default() -> Self {
        Self {
            entity_type: None,
            center: None,
            depth: 2,
            include_hidden: false,
        }
    }
}

/// One node of the visualization payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNode {
    /// Entity id (UUID string)
    pub id: String,

    /// Display name
    pub name: String,

    /// Canonical name
    pub canonical_name: String,

    /// Open-ended type tag
    pub entity_type: String,

    /// Display group for coloring
    pub group: u32,
}

/// One edge of the visualization payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphLink {
    /// Relationship id (UUID string)
    pub id: String,

    /// Source entity id (UUID string)
    pub source: String,

    /// Target entity id (UUID string)
    pub target: String,

    /// Raw relationship type
    pub relationship_type: String,

    /// Human-readable edge label
    pub label: String,

    /// Label for backward traversal, when defined
    pub reverse_label: Option<String>,
}

/// Nodes and links of one assembled subgraph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphData {
    /// Included nodes
    pub nodes: Vec<GraphNode>,

    /// Included links
    pub links: Vec<GraphLink>,
}

/// Aggregate counts for filter UIs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphStats {
    /// Node count
    pub total_nodes: usize,

    /// Link count
    pub total_links: usize,

    /// Node counts per entity type
    pub nodes_by_type: BTreeMap<String, usize>,

    /// Link counts per relationship type
    pub links_by_type: BTreeMap<String, usize>,
}

/// The full graph query response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphResponse {
    /// Visualization payload
    pub graph: GraphData,

    /// Aggregate counts
    pub stats: GraphStats,
}

/// Assemble a filtered subgraph from one campaign's persisted data
pub fn assemble(
    entities: &[Entity],
    relationships: &[Relationship],
    filter: &GraphFilter,
) -> GraphResponse {
    // Visibility and type filters apply to entities first
    let visible: Vec<&Entity> = entities
        .iter()
        .filter(|e| filter.include_hidden || e.visibility == Visibility::Public)
        .filter(|e| match &filter.entity_type {
            Some(wanted) => canonicalize(&e.entity_type) == canonicalize(wanted),
            None => true,
        })
        .collect();

    let mut ids: HashSet<EntityId> = visible.iter().map(|e| e.id).collect();

    // A relationship with a filtered endpoint is dropped
    let surviving: Vec<&Relationship> = relationships
        .iter()
        .filter(|r| ids.contains(&r.source_entity_id) && ids.contains(&r.target_entity_id))
        .collect();

    if let Some(center) = filter.center {
        ids = expand_from_center(center, &ids, &surviving, filter.depth);
    }

    let nodes: Vec<GraphNode> = visible
        .iter()
        .filter(|e| ids.contains(&e.id))
        .map(|e| GraphNode {
            id: e.id.to_string(),
            name: e.name.clone(),
            canonical_name: e.canonical_name.clone(),
            entity_type: e.entity_type.clone(),
            group: type_group(&e.entity_type),
        })
        .collect();

    let links: Vec<GraphLink> = surviving
        .iter()
        .filter(|r| ids.contains(&r.source_entity_id) && ids.contains(&r.target_entity_id))
        .map(|r| GraphLink {
            id: r.id.to_string(),
            source: r.source_entity_id.to_string(),
            target: r.target_entity_id.to_string(),
            relationship_type: r.relationship_type.clone(),
            label: humanize(&r.relationship_type),
            reverse_label: r.reverse_label.clone(),
        })
        .collect();

    let mut nodes_by_type: BTreeMap<String, usize> = BTreeMap::new();
    for node in &nodes {
        *nodes_by_type.entry(node.entity_type.clone()).or_default() += 1;
    }
    let mut links_by_type: BTreeMap<String, usize> = BTreeMap::new();
    for link in &links {
        *links_by_type.entry(link.relationship_type.clone()).or_default() += 1;
    }

    GraphResponse {
        stats: GraphStats {
            total_nodes: nodes.len(),
            total_links: links.len(),
            nodes_by_type,
            links_by_type,
        },
        graph: GraphData { nodes, links },
    }
}

/// Breadth-first expansion over the filtered relationships, undirected
///
/// Depth 0 includes only the center. A center that was itself filtered out
/// yields an empty graph.
fn expand_from_center(
    center: EntityId,
    ids: &HashSet<EntityId>,
    relationships: &[&Relationship],
    depth: usize,
) -> HashSet<EntityId> {
    if !ids.contains(&center) {
        return HashSet::new();
    }

    let mut included = HashSet::from([center]);
    let mut frontier = HashSet::from([center]);

    for _ in 0..depth {
        let mut next = HashSet::new();
        for rel in relationships {
            if frontier.contains(&rel.source_entity_id)
                && !included.contains(&rel.target_entity_id)
            {
                next.insert(rel.target_entity_id);
            }
            if frontier.contains(&rel.target_entity_id)
                && !included.contains(&rel.source_entity_id)
            {
                next.insert(rel.source_entity_id);
            }
        }
        if next.is_empty() {
            break;
        }
        included.extend(next.iter().copied());
        frontier = next;
    }

    included
}

/// Turn a raw relationship type into a display label
fn humanize(relationship_type: &str) -> String {
    relationship_type.replace(['_', '-'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(campaign: &str, name: &str, entity_type: &str) -> Entity {
        Entity::new(campaign, name, entity_type, 100)
    }

    fn relationship(a: &Entity, rel_type: &str, b: &Entity) -> Relationship {
        Relationship::new("c1", a.id, b.id, rel_type, 100)
    }

    /// A-B, B-C, C-D chain plus the ids, for traversal tests
    fn chain() -> (Vec<Entity>, Vec<Relationship>) {
        let a = entity("c1", "A", "person");
        let b = entity("c1", "B", "person");
        let c = entity("c1", "C", "place");
        let d = entity("c1", "D", "place");
        let rels = vec![
            relationship(&a, "knows", &b),
            relationship(&b, "visits", &c),
            relationship(&c, "near", &d),
        ];
        (vec![a, b, c, d], rels)
    }

    fn names(response: &GraphResponse) -> Vec<String> {
        let mut names: Vec<String> = response.graph.nodes.iter().map(|n| n.name.clone()).collect();
        names.sort();
        names
    }

    #[test]
    fn test_unfiltered_graph_includes_everything() {
        let (entities, rels) = chain();
        let response = assemble(&entities, &rels, &GraphFilter::default());

        assert_eq!(response.stats.total_nodes, 4);
        assert_eq!(response.stats.total_links, 3);
    }

    #[test]
    fn test_depth_two_from_center() {
        let (entities, rels) = chain();
        let filter = GraphFilter {
            center: Some(entities[0].id),
            depth: 2,
            ..Default::default()
        };

        let response = assemble(&entities, &rels, &filter);
        // A-B, B-C, C-D centered on A with depth 2: {A, B, C}, D excluded
        assert_eq!(names(&response), vec!["A", "B", "C"]);
        assert_eq!(response.stats.total_links, 2);
    }

    #[test]
    fn test_depth_zero_is_center_only() {
        let (entities, rels) = chain();
        let filter = GraphFilter {
            center: Some(entities[1].id),
            depth: 0,
            ..Default::default()
        };

        let response = assemble(&entities, &rels, &filter);
        assert_eq!(names(&response), vec!["B"]);
        assert!(response.graph.links.is_empty());
    }

    #[test]
    fn test_depth_one_is_direct_neighbors() {
        let (entities, rels) = chain();
        let filter = GraphFilter {
            center: Some(entities[1].id),
            depth: 1,
            ..Default::default()
        };

        let response = assemble(&entities, &rels, &filter);
        // B's direct neighbors across undirected edges: A and C
        assert_eq!(names(&response), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_expansion_is_undirected() {
        let (entities, rels) = chain();
        // Centering on D walks edges backward: C at depth 1, B at depth 2
        let filter = GraphFilter {
            center: Some(entities[3].id),
            depth: 2,
            ..Default::default()
        };

        let response = assemble(&entities, &rels, &filter);
        assert_eq!(names(&response), vec!["B", "C", "D"]);
    }

    #[test]
    fn test_hidden_entities_excluded_by_default() {
        let (mut entities, rels) = chain();
        entities[3].visibility = Visibility::DmOnly;

        let response = assemble(&entities, &rels, &GraphFilter::default());
        assert_eq!(names(&response), vec!["A", "B", "C"]);
        // The C-D edge lost an endpoint
        assert_eq!(response.stats.total_links, 2);

        let dm_view = assemble(
            &entities,
            &rels,
            &GraphFilter {
                include_hidden: true,
                ..Default::default()
            },
        );
        assert_eq!(dm_view.stats.total_nodes, 4);
    }

    #[test]
    fn test_type_filter_drops_relationships() {
        let (entities, rels) = chain();
        let filter = GraphFilter {
            entity_type: Some("place".to_string()),
            ..Default::default()
        };

        let response = assemble(&entities, &rels, &filter);
        assert_eq!(names(&response), vec!["C", "D"]);
        // Only C-near-D survives: the others touch filtered-out people
        assert_eq!(response.stats.total_links, 1);
        assert_eq!(response.graph.links[0].relationship_type, "near");
    }

    #[test]
    fn test_filtered_out_center_yields_empty_graph() {
        let (mut entities, rels) = chain();
        entities[0].visibility = Visibility::DmOnly;

        let filter = GraphFilter {
            center: Some(entities[0].id),
            ..Default::default()
        };
        let response = assemble(&entities, &rels, &filter);
        assert!(response.graph.nodes.is_empty());
        assert!(response.graph.links.is_empty());
    }

    #[test]
    fn test_stats_count_by_type() {
        let (entities, rels) = chain();
        let response = assemble(&entities, &rels, &GraphFilter::default());

        assert_eq!(response.stats.nodes_by_type["person"], 2);
        assert_eq!(response.stats.nodes_by_type["place"], 2);
        assert_eq!(response.stats.links_by_type["knows"], 1);
        assert_eq!(response.stats.total_links, 3);
    }

    #[test]
    fn test_type_groups_with_fallback() {
        assert_eq!(type_group("person"), 1);
        assert_eq!(type_group("PLACE"), 2);
        assert_eq!(type_group("Faction"), 4);
        // Open typing: unknown tags get the fallback group
        assert_eq!(type_group("ghost ship"), 0);
    }

    #[test]
    fn test_link_labels_humanized() {
        let a = entity("c1", "A", "person");
        let b = entity("c1", "B", "faction");
        let rels = vec![relationship(&a, "sworn_enemy-of", &b)];
        let entities = vec![a, b];

        let response = assemble(&entities, &rels, &GraphFilter::default());
        assert_eq!(response.graph.links[0].label, "sworn enemy of");
    }

    #[test]
    fn test_response_serializes() {
        let (entities, rels) = chain();
        let response = assemble(&entities, &rels, &GraphFilter::default());

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"nodes\""));
        assert!(json.contains("\"links\""));
        assert!(json.contains("\"total_nodes\":4"));
    }
}
