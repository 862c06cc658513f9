//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Lorekeeper CLI - build a campaign knowledge graph from your notes.
#[derive(Debug, Parser)]
#[command(name = "lorekeeper")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Database file (defaults to the configured path)
    #[arg(long, global = true, env = "LOREKEEPER_DB")]
    pub db: Option<PathBuf>,

    /// Campaign to operate on (defaults to the configured campaign)
    #[arg(short, long, global = true)]
    pub campaign: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract entities and relationships from a text file into a preview
    Extract(ExtractArgs),

    /// Review and commit a previously extracted preview
    Commit(CommitArgs),

    /// Query the knowledge graph for visualization
    Graph(GraphArgs),

    /// Create a single entity by hand
    NewEntity(NewEntityArgs),
}

/// Arguments for the extract command.
#[derive(Debug, Parser)]
pub struct ExtractArgs {
    /// Text file to extract from
    pub file: PathBuf,

    /// Where to write the reviewable preview JSON
    #[arg(short, long, default_value = "preview.json")]
    pub out: PathBuf,

    /// Extraction mode
    #[arg(long, value_enum, default_value = "balanced")]
    pub mode: ModeArg,

    /// Drop entities below this confidence
    #[arg(long)]
    pub confidence_threshold: Option<f64>,

    /// Skip relationship extraction
    #[arg(long)]
    pub no_relationships: bool,

    /// Ollama model to use
    #[arg(long)]
    pub model: Option<String>,
}

/// Extraction mode flag.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum ModeArg {
    /// Only clearly significant entities
    Conservative,
    /// Entities that matter to the narrative (default)
    Balanced,
    /// Every named thing
    Obsessive,
}

/// Arguments for the commit command.
#[derive(Debug, Parser)]
pub struct CommitArgs {
    /// Preview JSON produced by `lorekeeper extract`
    pub preview: PathBuf,

    /// Name recorded as the source document
    #[arg(long)]
    pub document_name: Option<String>,

    /// Approve every pending candidate before committing
    #[arg(long)]
    pub approve_all: bool,

    /// Reject a candidate by temp id (repeatable)
    #[arg(long = "reject", value_name = "TEMP_ID")]
    pub rejects: Vec<String>,

    /// Merge a candidate into an existing entity: TEMP_ID=ENTITY_ID (repeatable)
    #[arg(long = "merge", value_name = "TEMP_ID=ENTITY_ID")]
    pub merges: Vec<String>,
}

/// Arguments for the graph command.
#[derive(Debug, Parser)]
pub struct GraphArgs {
    /// Center the graph on this entity id
    #[arg(long)]
    pub center: Option<String>,

    /// Hop depth around the center
    #[arg(long, default_value = "2")]
    pub depth: usize,

    /// Only include entities of this type
    #[arg(long = "type")]
    pub entity_type: Option<String>,

    /// Include DM-only entities
    #[arg(long)]
    pub include_hidden: bool,
}

/// Arguments for the new-entity command.
#[derive(Debug, Parser)]
pub struct NewEntityArgs {
    /// Entity name
    pub name: String,

    /// Entity type tag
    #[arg(short = 't', long, default_value = "unknown")]
    pub entity_type: String,

    /// Wiki content
    #[arg(long, default_value = "")]
    pub content: String,

    /// Mark the entity DM-only
    #[arg(long)]
    pub hidden: bool,
}
