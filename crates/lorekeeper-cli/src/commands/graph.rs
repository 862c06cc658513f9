//! The graph command: query the persisted graph for visualization.

use crate::cli::GraphArgs;
use crate::commands::open_store;
use anyhow::Result;
use lorekeeper_domain::traits::EntityStore;
use lorekeeper_domain::EntityId;
use lorekeeper_graph::{assemble, GraphFilter};
use std::path::Path;

/// Assemble and print a filtered subgraph as JSON
pub fn execute_graph(args: GraphArgs, db: &Path, campaign: &str) -> Result<()> {
    let store = open_store(db)?;
    let entities = store.list_entities(campaign)?;
    let relationships = store.list_relationships(campaign)?;

    let center = args
        .center
        .as_deref()
        .map(EntityId::from_string)
        .transpose()
        .map_err(anyhow::Error::msg)?;

    let filter = GraphFilter {
        entity_type: args.entity_type,
        center,
        depth: args.depth,
        include_hidden: args.include_hidden,
    };

    let response = assemble(&entities, &relationships, &filter);
    println!("{}", serde_json::to_string_pretty(&response)?);

    Ok(())
}
