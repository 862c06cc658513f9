//! Command implementations.

mod commit;
mod extract;
mod graph;
mod new_entity;

pub use commit::execute_commit;
pub use extract::execute_extract;
pub use graph::execute_graph;
pub use new_entity::execute_new_entity;

use anyhow::{Context, Result};
use lorekeeper_store::SqliteStore;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The on-disk preview format shared by `extract` and `commit`
#[derive(Debug, Serialize, Deserialize)]
pub struct PreviewFile {
    /// Name of the source document
    pub document_name: String,

    /// Full text of the source document
    pub document_content: String,

    /// The reviewable extraction preview
    pub preview: lorekeeper_extractor::ExtractPreview,
}

/// Open the store, creating the database directory if needed
pub(crate) fn open_store(path: &Path) -> Result<SqliteStore> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    SqliteStore::new(path).with_context(|| format!("Failed to open {}", path.display()))
}
