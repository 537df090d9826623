//! Ask command handler.
//!
//! Runs a single turn in a fresh session.

use clap::Args;
use juris_core::{config::AppConfig, AppError};

/// Ask a single question
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub query: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> anyhow::Result<()> {
        tracing::info!("Executing ask command");

        if self.query.trim().is_empty() {
            return Err(AppError::Config("No question provided".to_string()).into());
        }

        let mut session = super::open_session(config, !self.json).await?;
        let turn = session.handle_turn(&self.query).await?;

        if self.json {
            let output = serde_json::json!({
                "sessionId": session.id(),
                "provider": config.provider,
                "model": config.model,
                "turn": turn,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("{}", turn.response);
            tracing::debug!(
                mode = turn.mode.as_str(),
                retrieval = ?turn.retrieval,
                "Turn complete"
            );
        }

        Ok(())
    }
}
