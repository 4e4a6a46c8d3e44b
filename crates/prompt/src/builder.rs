//! Prompt builder for rendering templates.

use crate::types::{BuiltPrompt, PromptDefinition};
use concierge_core::{AppError, AppResult};
use handlebars::Handlebars;
use std::collections::HashMap;

/// Build a prompt from a definition and template variables.
///
/// # Example
/// ```no_run
/// use concierge_prompt::{build_prompt, builtin_prompt, SYSTEM_PROMPT_ID};
/// use std::collections::HashMap;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let def = builtin_prompt(SYSTEM_PROMPT_ID)?;
/// let mut vars = HashMap::new();
/// vars.insert("businessName".to_string(), "Vinetos de Sol".to_string());
///
/// let built = build_prompt(&def, vars)?;
/// println!("System: {}", built.system);
/// # Ok(())
/// # }
/// ```
pub fn build_prompt(
    definition: &PromptDefinition,
    variables: HashMap<String, String>,
) -> AppResult<BuiltPrompt> {
    tracing::debug!("Building prompt: {}", definition.id);

    let rendered = render_template(&definition.template, &variables)?;

    Ok(BuiltPrompt::new(rendered, definition.id.clone(), variables))
}

/// Render a Handlebars template with variables.
fn render_template(template: &str, variables: &HashMap<String, String>) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Disable HTML escaping for plain text
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    let rendered = handlebars
        .render("prompt", &variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))?;

    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{builtin_prompt, SYSTEM_PROMPT_ID};

    #[test]
    fn test_render_simple_template() {
        let mut vars = HashMap::new();
        vars.insert("businessName".to_string(), "Vinetos & Sol".to_string());

        let rendered = render_template("Welcome to {{businessName}}", &vars).unwrap();
        assert_eq!(rendered, "Welcome to Vinetos & Sol");
    }

    #[test]
    fn test_build_builtin_system_prompt() {
        let def = builtin_prompt(SYSTEM_PROMPT_ID).unwrap();
        let mut vars = HashMap::new();
        vars.insert("businessName".to_string(), "Vinetos de Sol".to_string());

        let built = build_prompt(&def, vars).unwrap();
        assert_eq!(
            built.system,
            "You are a helpful and knowledgeable conversational concierge for Vinetos de Sol winery.\n\
             Answer questions about the winery using the provided document.\n\
             For all other questions, use the search tools provided to find real-time information."
        );
        assert_eq!(built.metadata.source_prompt_id, SYSTEM_PROMPT_ID);
    }

    #[test]
    fn test_render_template_missing_variable() {
        let vars = HashMap::new();
        // Handlebars renders missing variables as empty string
        let rendered = render_template("Question: {{missing}}", &vars).unwrap();
        assert_eq!(rendered, "Question: ");
    }

    #[test]
    fn test_render_template_syntax_error() {
        let vars = HashMap::new();
        assert!(render_template("{{#if flag}}unclosed", &vars).is_err());
    }
}
