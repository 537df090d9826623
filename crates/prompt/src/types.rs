//! Prompt definitions and rendered prompts.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A prompt template as written in YAML.
///
/// ```yaml
/// id: summarize.initial
/// title: Brief initial answer
/// apiVersion: "1.0"
/// inputVariables: [query, context]
/// template: |
///   User Query: {{query}}
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptDefinition {
    pub id: String,

    pub title: String,

    /// Schema version in `major.minor` form
    pub api_version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Variables the template expects; rendering fails if one is missing
    #[serde(default)]
    pub input_variables: Vec<String>,

    /// Handlebars template
    pub template: String,
}

/// A template rendered with concrete values, ready to send to a model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuiltPrompt {
    pub text: String,

    /// Id of the definition this was rendered from
    pub prompt_id: String,

    pub variables: HashMap<String, String>,
}

impl BuiltPrompt {
    pub fn new(text: String, prompt_id: String, variables: HashMap<String, String>) -> Self {
        Self {
            text,
            prompt_id,
            variables,
        }
    }
}
