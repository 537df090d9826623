//! Conversational agents for the Juris assistant.
//!
//! - [`QueryAgent`] answers a question from retrieved passages
//! - [`SummarizationAgent`] shapes that answer into a brief reply or a
//!   detailed follow-up
//! - [`ConversationMemory`] keeps the last few exchanges
//! - [`Session`] ties them to a loaded knowledge base

pub mod memory;
pub mod query;
pub mod session;
pub mod summarize;

#[cfg(test)]
mod testing;

pub use memory::{ConversationMemory, Interaction, DEFAULT_MEMORY_CAPACITY};
pub use query::{render_retrieval, QueryAgent, Retrieval, RetrievalStatus, NO_CONTEXT_MESSAGE};
pub use session::{
    DocumentReport, LoadReport, PromptSet, Role, Session, SessionSettings, TranscriptEntry, Turn,
};
pub use summarize::{is_detailed_request, ResponseMode, SummarizationAgent, DETAIL_KEYWORDS};
