//! Prompt system for the Juris assistant.
//!
//! This crate provides structured prompt management with:
//! - YAML-based prompt definitions, built in and overridable per workspace
//! - Declared input variables checked before rendering
//! - Handlebars template rendering

pub mod builder;
pub mod loader;
pub mod types;

pub use builder::build_prompt;
pub use loader::{
    builtin_prompt, list_prompts, load_prompt, override_path, PromptSource, DETAILED_PROMPT_ID,
    INITIAL_PROMPT_ID, QUERY_PROMPT_ID,
};
pub use types::{BuiltPrompt, PromptDefinition};
