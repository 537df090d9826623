//! Command handlers for the Juris CLI.

pub mod ask;
pub mod chat;
pub mod docs;
pub mod prompts;

pub use ask::AskCommand;
pub use chat::ChatCommand;
pub use docs::DocsCommand;
pub use prompts::PromptsCommand;

use juris_agent::Session;
use juris_core::{config::AppConfig, AppResult};
use juris_knowledge::{DocumentLoader, ProgressEvent, ProgressReporter};
use std::sync::Arc;

/// Validate the configuration, build a session and load the documents.
///
/// Progress lines go to stderr when `show_progress` is set.
pub(crate) async fn open_session(config: &AppConfig, show_progress: bool) -> AppResult<Session> {
    config.validate()?;

    let progress = if show_progress {
        ProgressReporter::new(Arc::new(|event: ProgressEvent| {
            eprintln!("{}", event.format_simple());
        }))
    } else {
        ProgressReporter::noop()
    };

    let mut session = Session::from_config(config).await?.with_progress(progress);
    let documents = config.resolved_documents();
    session.load(&DocumentLoader::new(), &documents).await?;

    Ok(session)
}
