//! Prompts command handler.
//!
//! Shows which prompt templates are active and where each one comes from.

use clap::{Args, Subcommand};
use juris_core::config::AppConfig;
use juris_prompt::{list_prompts, load_prompt, override_path, PromptSource};

/// Inspect the prompt templates
#[derive(Args, Debug)]
pub struct PromptsCommand {
    #[command(subcommand)]
    pub action: PromptsAction,
}

#[derive(Subcommand, Debug)]
pub enum PromptsAction {
    /// List built-in prompts and workspace overrides
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print one prompt's template
    Show {
        /// Prompt id, e.g. summarize.initial
        id: String,
    },
}

impl PromptsCommand {
    pub fn execute(&self, config: &AppConfig) -> anyhow::Result<()> {
        tracing::info!("Executing prompts command");

        match &self.action {
            PromptsAction::List { json } => list(config, *json),
            PromptsAction::Show { id } => show(config, id),
        }
    }
}

fn list(config: &AppConfig, json: bool) -> anyhow::Result<()> {
    let prompts = list_prompts(&config.workspace)?;

    if json {
        let entries: Vec<_> = prompts
            .iter()
            .map(|(id, source)| serde_json::json!({ "id": id, "source": source }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    for (id, source) in &prompts {
        println!("{:<22} {}", id, source_label(*source));
    }
    Ok(())
}

fn show(config: &AppConfig, id: &str) -> anyhow::Result<()> {
    let definition = load_prompt(&config.workspace, id)?;

    println!("{} ({})", definition.title, definition.id);
    if let Some(description) = &definition.description {
        println!("{}", description);
    }
    println!("Variables: {}", definition.input_variables.join(", "));

    let path = override_path(&config.workspace, id);
    if path.exists() {
        println!("Override: {}", path.display());
    }

    println!();
    print!("{}", definition.template);
    Ok(())
}

fn source_label(source: PromptSource) -> &'static str {
    match source {
        PromptSource::Builtin => "built-in",
        PromptSource::Workspace => "workspace override",
    }
}
