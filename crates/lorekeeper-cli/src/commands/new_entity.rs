//! The new-entity command: manual entity creation.

use crate::cli::NewEntityArgs;
use crate::commands::open_store;
use anyhow::{bail, Result};
use colored::Colorize;
use lorekeeper_domain::traits::EntityStore;
use lorekeeper_domain::{Entity, Visibility};
use lorekeeper_store::StoreError;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// Create a single entity by hand
///
/// A duplicate canonical name is rejected before any write, with a
/// user-facing message rather than a stack of storage errors.
pub fn execute_new_entity(args: NewEntityArgs, db: &Path, campaign: &str) -> Result<()> {
    let mut store = open_store(db)?;

    let created_at = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();

    let mut entity = Entity::new(campaign, &args.name, &args.entity_type, created_at);
    entity.content = args.content;
    entity.visibility = if args.hidden {
        Visibility::DmOnly
    } else {
        Visibility::Public
    };

    match store.create_entity(entity) {
        Ok(id) => {
            println!("{} {} ({})", "Created:".green().bold(), args.name, id);
            Ok(())
        }
        Err(e @ StoreError::DuplicateCanonicalName(_)) => bail!("{}", e),
        Err(e) => Err(e.into()),
    }
}
