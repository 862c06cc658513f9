//! The commit command: reviewed preview -> persisted graph.

use crate::cli::CommitArgs;
use crate::commands::{open_store, PreviewFile};
use anyhow::{bail, Context, Result};
use colored::Colorize;
use lorekeeper_domain::EntityId;
use lorekeeper_review::{CommitRequest, Committer, ReviewQueue};
use lorekeeper_store::EmbeddingIndex;
use std::fs;
use std::path::Path;

/// Apply review flags to a staged preview and commit it
pub async fn execute_commit(args: CommitArgs, db: &Path, campaign: &str) -> Result<()> {
    let raw = fs::read_to_string(&args.preview)
        .with_context(|| format!("Failed to read {}", args.preview.display()))?;
    let preview_file: PreviewFile = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a valid preview file", args.preview.display()))?;

    let mut queue = ReviewQueue::from_preview(preview_file.preview);

    for merge in &args.merges {
        let (temp_id, entity_id) = merge
            .split_once('=')
            .with_context(|| format!("--merge '{}' is not TEMP_ID=ENTITY_ID", merge))?;
        let entity_id = EntityId::from_string(entity_id).map_err(anyhow::Error::msg)?;
        queue.set_merge_target(temp_id, entity_id)?;
    }
    for temp_id in &args.rejects {
        queue.reject(temp_id)?;
    }
    if args.approve_all {
        queue.approve_all_pending();
    }

    if queue.approved_entities().next().is_none() {
        bail!("Nothing to commit: approve candidates with --approve-all or --merge first");
    }

    let mut store = open_store(db)?;
    let index = EmbeddingIndex::open(db)?;
    let committer = Committer::new(index);

    let request = CommitRequest {
        campaign_id: campaign.to_string(),
        document_name: args
            .document_name
            .unwrap_or_else(|| preview_file.document_name.clone()),
        document_content: preview_file.document_content,
    };

    let report = committer.commit(&queue, &request, &mut store).await?;

    println!(
        "{} {} created, {} merged, {} relationships",
        "Committed:".green().bold(),
        report.created.len(),
        report.merged.len(),
        report.relationships_created
    );
    for entity in &report.created {
        println!("  {} {} ({})", "+".green(), entity.name, entity.entity_id);
    }
    for entity in &report.merged {
        println!("  {} {} -> {}", "~".yellow(), entity.name, entity.entity_id);
    }
    if report.entities_skipped > 0 || report.relationships_skipped > 0 {
        println!(
            "{} {} entities, {} relationships skipped (see logs)",
            "Warning:".yellow().bold(),
            report.entities_skipped,
            report.relationships_skipped
        );
    }

    let index_status = &report.index;
    if index_status.pending > 0 || index_status.failed > 0 {
        println!(
            "Index sync: {}/{} done, {} failed, {} still pending",
            index_status.succeeded, index_status.total, index_status.failed, index_status.pending
        );
    } else if index_status.total > 0 {
        println!("Index sync: {}/{} done", index_status.succeeded, index_status.total);
    }

    Ok(())
}
