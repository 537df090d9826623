//! Prompt loader for YAML prompt definitions.
//!
//! Every prompt the agents use ships with the binary. A workspace can
//! replace any of them by dropping `<id>.yml` into `.juris/prompts/`.

use crate::types::PromptDefinition;
use juris_core::{AppError, AppResult};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Prompt used by the query agent to answer from retrieved passages.
pub const QUERY_PROMPT_ID: &str = "query.retrieve";

/// Prompt for a brief first answer ending with a follow-up invitation.
pub const INITIAL_PROMPT_ID: &str = "summarize.initial";

/// Prompt for a structured, in-depth follow-up answer.
pub const DETAILED_PROMPT_ID: &str = "summarize.detailed";

const BUILTIN_PROMPTS: [(&str, &str); 3] = [
    (
        QUERY_PROMPT_ID,
        include_str!("../prompts/query.retrieve.yml"),
    ),
    (
        INITIAL_PROMPT_ID,
        include_str!("../prompts/summarize.initial.yml"),
    ),
    (
        DETAILED_PROMPT_ID,
        include_str!("../prompts/summarize.detailed.yml"),
    ),
];

fn prompts_dir(workspace_path: &Path) -> PathBuf {
    workspace_path.join(".juris/prompts")
}

/// Load a prompt definition by ID.
///
/// The workspace override at `.juris/prompts/<id>.yml` wins over the
/// built-in definition of the same ID.
///
/// # Example
/// ```no_run
/// use juris_prompt::load_prompt;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompt = load_prompt(Path::new("."), "summarize.initial")?;
/// println!("Loaded prompt: {}", prompt.title);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(workspace_path: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    let prompt_file = override_path(workspace_path, prompt_id);

    if prompt_file.exists() {
        tracing::debug!("Loading prompt override from: {:?}", prompt_file);

        let contents = std::fs::read_to_string(&prompt_file).map_err(|e| {
            AppError::Prompt(format!(
                "Failed to read prompt file {:?}: {}",
                prompt_file, e
            ))
        })?;

        let definition = parse_prompt(&contents, &prompt_file.display().to_string())?;
        tracing::info!("Loaded prompt override: {} ({})", definition.id, definition.title);
        return Ok(definition);
    }

    let contents = builtin_prompt(prompt_id)
        .ok_or_else(|| AppError::Prompt(format!("Unknown prompt: {}", prompt_id)))?;

    parse_prompt(contents, prompt_id)
}

/// Raw YAML of a built-in prompt.
pub fn builtin_prompt(prompt_id: &str) -> Option<&'static str> {
    BUILTIN_PROMPTS
        .iter()
        .find(|(id, _)| *id == prompt_id)
        .map(|(_, yaml)| *yaml)
}

/// Where a prompt definition comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptSource {
    Builtin,
    Workspace,
}

/// Path a workspace override for `prompt_id` would live at.
pub fn override_path(workspace_path: &Path, prompt_id: &str) -> PathBuf {
    prompts_dir(workspace_path).join(format!("{}.yml", prompt_id))
}

/// List every available prompt ID with the source [`load_prompt`] would
/// read it from. Sorted by ID.
pub fn list_prompts(workspace_path: &Path) -> AppResult<Vec<(String, PromptSource)>> {
    let mut prompts: BTreeMap<String, PromptSource> = BUILTIN_PROMPTS
        .iter()
        .map(|(id, _)| (id.to_string(), PromptSource::Builtin))
        .collect();

    let dir = prompts_dir(workspace_path);
    if dir.exists() {
        for entry in walkdir::WalkDir::new(&dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("yml") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    prompts.insert(stem.to_string(), PromptSource::Workspace);
                }
            }
        }
    }

    Ok(prompts.into_iter().collect())
}

fn parse_prompt(contents: &str, origin: &str) -> AppResult<PromptDefinition> {
    let definition: PromptDefinition = serde_yaml::from_str(contents).map_err(|e| {
        AppError::Prompt(format!("Failed to parse prompt YAML {}: {}", origin, e))
    })?;

    validate_prompt(&definition)?;
    Ok(definition)
}

/// Validate a prompt definition.
fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.title.is_empty() {
        return Err(AppError::Prompt("Prompt title cannot be empty".to_string()));
    }

    if def.template.trim().is_empty() {
        return Err(AppError::Prompt(
            "Prompt template cannot be empty".to_string(),
        ));
    }

    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        )));
    }

    for var in &def.input_variables {
        if !template_references(&def.template, var) {
            return Err(AppError::Prompt(format!(
                "Prompt '{}' declares variable '{}' but its template never uses it",
                def.id, var
            )));
        }
    }

    Ok(())
}

/// Whether any `{{ ... }}` expression in `template` mentions `var`,
/// ignoring whitespace, triple braces and block markers such as `#if`.
fn template_references(template: &str, var: &str) -> bool {
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            return false;
        };

        let expression = after[..end].trim_matches(|c: char| c == '{' || c == '~');
        if expression
            .split_whitespace()
            .map(|token| token.trim_start_matches(['#', '/', '^']))
            .any(|token| token == var)
        {
            return true;
        }
        rest = &after[end + 2..];
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_override(dir: &Path, id: &str, content: &str) -> PathBuf {
        let prompts_dir = dir.join(".juris/prompts");
        fs::create_dir_all(&prompts_dir).unwrap();
        let file_path = prompts_dir.join(format!("{}.yml", id));
        fs::write(&file_path, content).unwrap();
        file_path
    }

    #[test]
    fn test_builtin_prompts_are_valid() {
        let temp_dir = TempDir::new().unwrap();
        for id in [QUERY_PROMPT_ID, INITIAL_PROMPT_ID, DETAILED_PROMPT_ID] {
            let prompt = load_prompt(temp_dir.path(), id).unwrap();
            assert_eq!(prompt.id, id);
        }
    }

    #[test]
    fn test_builtin_variables() {
        let temp_dir = TempDir::new().unwrap();
        let detailed = load_prompt(temp_dir.path(), DETAILED_PROMPT_ID).unwrap();
        assert_eq!(
            detailed.input_variables,
            vec!["query", "context", "conversation_history"]
        );

        let initial = load_prompt(temp_dir.path(), INITIAL_PROMPT_ID).unwrap();
        assert_eq!(initial.input_variables, vec!["query", "context"]);
        assert!(initial
            .template
            .contains("Would you like more details on any step?"));
    }

    #[test]
    fn test_workspace_override_wins() {
        let temp_dir = TempDir::new().unwrap();
        write_override(
            temp_dir.path(),
            INITIAL_PROMPT_ID,
            r#"
id: summarize.initial
title: "Shorter"
apiVersion: "1.1"
inputVariables: [query, context]
template: "Answer {{query}} from {{context}} in one line."
"#,
        );

        let prompt = load_prompt(temp_dir.path(), INITIAL_PROMPT_ID).unwrap();
        assert_eq!(prompt.title, "Shorter");
        assert_eq!(prompt.api_version, "1.1");
    }

    #[test]
    fn test_load_unknown_prompt() {
        let temp_dir = TempDir::new().unwrap();
        let result = load_prompt(temp_dir.path(), "nonexistent");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_invalid_yaml_override() {
        let temp_dir = TempDir::new().unwrap();
        write_override(temp_dir.path(), "broken", "invalid: yaml: content:");

        let result = load_prompt(temp_dir.path(), "broken");
        assert!(result.is_err());
    }

    #[test]
    fn test_declared_variable_must_appear_in_template() {
        let temp_dir = TempDir::new().unwrap();
        write_override(
            temp_dir.path(),
            "unused.var",
            r#"
id: unused.var
title: "Unused"
apiVersion: "1.0"
inputVariables: [query, context]
template: "Only {{query}}"
"#,
        );

        let err = load_prompt(temp_dir.path(), "unused.var").unwrap_err();
        assert!(err.to_string().contains("context"));
    }

    #[test]
    fn test_spaced_placeholders_are_accepted() {
        let temp_dir = TempDir::new().unwrap();
        write_override(
            temp_dir.path(),
            "spaced",
            r#"
id: spaced
title: "Spaced"
apiVersion: "1.0"
inputVariables: [query, context, conversation_history]
template: "{{#if conversation_history}}{{ conversation_history }}{{/if}} Q: {{ query }} C: {{{context}}}"
"#,
        );

        let prompt = load_prompt(temp_dir.path(), "spaced").unwrap();
        assert_eq!(prompt.input_variables.len(), 3);
    }

    #[test]
    fn test_template_references() {
        assert!(template_references("{{query}}", "query"));
        assert!(template_references("a {{  query\n}} b", "query"));
        assert!(template_references("{{~ query ~}}", "query"));
        assert!(!template_references("{{query_text}}", "query"));
        assert!(!template_references("query without braces", "query"));
        assert!(!template_references("{{query", "query"));
    }

    #[test]
    fn test_list_prompts_merges_overrides() {
        let temp_dir = TempDir::new().unwrap();
        write_override(temp_dir.path(), "custom.extra", "id: custom.extra");
        write_override(temp_dir.path(), INITIAL_PROMPT_ID, "id: summarize.initial");

        let prompts = list_prompts(temp_dir.path()).unwrap();
        assert_eq!(
            prompts,
            vec![
                ("custom.extra".to_string(), PromptSource::Workspace),
                (QUERY_PROMPT_ID.to_string(), PromptSource::Builtin),
                (DETAILED_PROMPT_ID.to_string(), PromptSource::Builtin),
                (INITIAL_PROMPT_ID.to_string(), PromptSource::Workspace),
            ]
        );
    }

    #[test]
    fn test_list_prompts_without_overrides() {
        let temp_dir = TempDir::new().unwrap();
        let prompts = list_prompts(temp_dir.path()).unwrap();
        assert_eq!(prompts.len(), 3);
        assert!(prompts.iter().all(|(_, source)| *source == PromptSource::Builtin));
    }
}
