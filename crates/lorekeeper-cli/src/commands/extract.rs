//! The extract command: text file -> reviewable preview JSON.

use crate::cli::{ExtractArgs, ModeArg};
use crate::commands::{open_store, PreviewFile};
use crate::config::Config;
use anyhow::{Context, Result};
use colored::Colorize;
use lorekeeper_domain::traits::EntityStore;
use lorekeeper_extractor::{
    ExtractionRequest, ExtractionSettings, Extractor, KnownEntity, ProgressEvent, ProgressObserver,
};
use lorekeeper_llm::OllamaProvider;
use std::fs;
use std::path::Path;

/// Observer that narrates pipeline progress on the terminal
struct ConsoleObserver;

impl ProgressObserver for ConsoleObserver {
    fn on_event(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::Progress { message, .. } => {
                println!("{}", message.dimmed());
            }
            ProgressEvent::Extraction {
                current,
                total,
                message,
                ..
            } => {
                println!("{} {}", format!("[{}/{}]", current, total).bold(), message);
            }
            ProgressEvent::Entity { name, entity_type } => {
                println!("  {} {} ({})", "+".green(), name, entity_type.dimmed());
            }
            ProgressEvent::Error { message } => {
                eprintln!("{} {}", "error:".red().bold(), message);
            }
            ProgressEvent::Complete { .. } => {}
        }
    }
}

/// Run extraction over a text file and write the preview JSON
pub async fn execute_extract(
    args: ExtractArgs,
    config: &Config,
    db: &Path,
    campaign: &str,
) -> Result<()> {
    let content = fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let document_name = args
        .file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| args.file.display().to_string());

    let store = open_store(db)?;
    let known_entities: Vec<KnownEntity> = store
        .list_entities(campaign)?
        .iter()
        .map(KnownEntity::from)
        .collect();

    let mut settings = match args.mode {
        ModeArg::Conservative => ExtractionSettings::conservative(),
        ModeArg::Balanced => ExtractionSettings::default(),
        ModeArg::Obsessive => ExtractionSettings::obsessive(),
    };
    if let Some(threshold) = args.confidence_threshold {
        settings.confidence_threshold = threshold;
    }
    if args.no_relationships {
        settings.enable_relationships = false;
    }

    let model = args.model.unwrap_or_else(|| config.ollama_model.clone());
    let provider = OllamaProvider::new(&config.ollama_endpoint, model);
    let extractor = Extractor::new(provider, settings);

    let request = ExtractionRequest {
        content: content.clone(),
        source_label: document_name.clone(),
        language: config.language.clone(),
        known_entities,
    };

    let outcome = extractor.extract(request, &ConsoleObserver).await?;
    let summary = outcome.summary;

    let preview_file = PreviewFile {
        document_name,
        document_content: content,
        preview: outcome.preview,
    };
    let json = serde_json::to_string_pretty(&preview_file)?;
    fs::write(&args.out, json)
        .with_context(|| format!("Failed to write {}", args.out.display()))?;
    println!();
    println!(
        "{} {} entities, {} relationships, {} likely duplicates ({} of {} sections failed, {}ms)",
        "Extracted:".green().bold(),
        summary.entities_found,
        summary.relationships_found,
        preview_file.preview.matches.len(),
        summary.chunks_failed,
        summary.chunks_total,
        summary.elapsed_ms
    );
    println!(
        "Review {} and run {}",
        args.out.display().to_string().bold(),
        format!("lorekeeper commit {}", args.out.display()).bold()
    );

    Ok(())
}
