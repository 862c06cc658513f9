//! Lorekeeper CLI - build a campaign knowledge graph from your notes.

use clap::Parser;
use lorekeeper_cli::commands;
use lorekeeper_cli::{Cli, Command, Config};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load or create config
    let config = Config::load().unwrap_or_else(|_| {
        let cfg = Config::default();
        cfg.save().ok();
        cfg
    });

    let db = cli.db.unwrap_or_else(|| config.database_path.clone());
    let campaign = cli.campaign.unwrap_or_else(|| config.campaign.clone());

    match cli.command {
        Command::Extract(args) => {
            commands::execute_extract(args, &config, &db, &campaign).await?;
        }
        Command::Commit(args) => {
            commands::execute_commit(args, &db, &campaign).await?;
        }
        Command::Graph(args) => {
            commands::execute_graph(args, &db, &campaign)?;
        }
        Command::NewEntity(args) => {
            commands::execute_new_entity(args, &db, &campaign)?;
        }
    }

    Ok(())
}
