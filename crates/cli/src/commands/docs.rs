//! Docs command handler.
//!
//! Loads the configured documents and shows what the assistant sees.

use clap::{Args, Subcommand};
use juris_core::config::AppConfig;

/// Inspect the loaded documents
#[derive(Args, Debug)]
pub struct DocsCommand {
    #[command(subcommand)]
    pub action: DocsAction,
}

#[derive(Subcommand, Debug)]
pub enum DocsAction {
    /// Load the documents and list chunk counts
    List(DocsListCommand),
    /// Show the passages retrieved for a query
    Search(DocsSearchCommand),
}

impl DocsCommand {
    pub async fn execute(&self, config: &AppConfig) -> anyhow::Result<()> {
        match &self.action {
            DocsAction::List(cmd) => cmd.execute(config).await,
            DocsAction::Search(cmd) => cmd.execute(config).await,
        }
    }
}

/// Load the documents and list chunk counts
#[derive(Args, Debug)]
pub struct DocsListCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl DocsListCommand {
    pub async fn execute(&self, config: &AppConfig) -> anyhow::Result<()> {
        tracing::info!("Executing docs list command");

        let session = super::open_session(config, !self.json).await?;
        let Some(report) = session.load_report() else {
            return Ok(());
        };

        if self.json {
            println!("{}", serde_json::to_string_pretty(report)?);
        } else {
            for (i, doc) in report.documents.iter().enumerate() {
                println!(
                    "{}. {} ({} pages with text) - {}",
                    i + 1,
                    doc.name,
                    doc.chunks,
                    doc.path.display()
                );
            }
            println!(
                "{} chunks indexed in {:.2}s",
                report.indexed_chunks, report.duration_secs
            );
        }

        Ok(())
    }
}

/// Show the passages retrieved for a query
#[derive(Args, Debug)]
pub struct DocsSearchCommand {
    /// Query text
    pub query: String,

    /// Number of chunks to retrieve (default: configured top-k)
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl DocsSearchCommand {
    pub async fn execute(&self, config: &AppConfig) -> anyhow::Result<()> {
        tracing::info!("Executing docs search command");

        let session = super::open_session(config, !self.json).await?;
        let k = self.top_k.unwrap_or(config.top_k);
        let results = session.search(&self.query, k).await?;

        if self.json {
            let hits: Vec<_> = results
                .iter()
                .map(|(chunk, score)| {
                    serde_json::json!({
                        "source": chunk.source,
                        "page": chunk.page,
                        "score": score,
                        "content": chunk.content,
                    })
                })
                .collect();
            let output = serde_json::json!({ "query": self.query, "results": hits });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else if results.is_empty() {
            println!("No passages found.");
        } else {
            for (i, (chunk, score)) in results.iter().enumerate() {
                println!(
                    "{}. [{:.3}] {}, page {}",
                    i + 1,
                    score,
                    chunk.source,
                    chunk.page
                );
                println!("   {}", preview(&chunk.content, 200));
            }
        }

        Ok(())
    }
}

/// First `max_chars` characters of `text`, with an ellipsis if cut.
fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
