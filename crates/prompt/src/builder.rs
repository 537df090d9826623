//! Prompt builder for rendering templates.

use crate::types::{BuiltPrompt, PromptDefinition};
use handlebars::Handlebars;
use juris_core::{AppError, AppResult};
use std::collections::HashMap;

/// Build a prompt from a definition and input variables.
///
/// Every variable the definition declares must be present in `variables`;
/// values are inserted verbatim (no HTML escaping).
///
/// # Example
/// ```no_run
/// use juris_prompt::{build_prompt, load_prompt};
/// use std::collections::HashMap;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let def = load_prompt(Path::new("."), "summarize.initial")?;
/// let mut vars = HashMap::new();
/// vars.insert("query".to_string(), "How do I file a suit?".to_string());
/// vars.insert("context".to_string(), "A suit begins with a plaint.".to_string());
///
/// let built = build_prompt(&def, vars)?;
/// println!("{}", built.text);
/// # Ok(())
/// # }
/// ```
pub fn build_prompt(
    definition: &PromptDefinition,
    variables: HashMap<String, String>,
) -> AppResult<BuiltPrompt> {
    tracing::debug!("Building prompt: {}", definition.id);

    if let Some(missing) = definition
        .input_variables
        .iter()
        .find(|var| !variables.contains_key(*var))
    {
        return Err(AppError::Prompt(format!(
            "Missing variable '{}' for prompt '{}'",
            missing, definition.id
        )));
    }

    let rendered = render_template(&definition.template, &variables)?;

    Ok(BuiltPrompt::new(rendered, definition.id.clone(), variables))
}

/// Render a Handlebars template with variables.
fn render_template(template: &str, variables: &HashMap<String, String>) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Legal text is full of quotes and ampersands; keep them as-is
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    let rendered = handlebars
        .render("prompt", &variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))?;

    Ok(rendered)
}
