//! Prompt loader for YAML prompt definitions.

use crate::types::PromptDefinition;
use concierge_core::{AppError, AppResult};
use std::path::Path;

/// Identifier of the concierge system instruction.
pub const SYSTEM_PROMPT_ID: &str = "concierge.system";

const BUILTIN_SYSTEM_PROMPT: &str = include_str!("../prompts/concierge.system.yml");

/// Load a prompt definition by ID from a prompts directory.
///
/// This function looks for a file named `<id>.yml` in `prompts_dir`.
///
/// # Example
/// ```no_run
/// use concierge_prompt::load_prompt;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompt = load_prompt(Path::new(".concierge/prompts"), "concierge.system")?;
/// println!("Loaded prompt: {}", prompt.title);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(prompts_dir: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    let prompt_file = prompts_dir.join(format!("{}.yml", prompt_id));

    tracing::debug!("Loading prompt from: {:?}", prompt_file);

    if !prompt_file.exists() {
        return Err(AppError::Prompt(format!(
            "Prompt file not found: {:?}",
            prompt_file
        )));
    }

    let contents = std::fs::read_to_string(&prompt_file).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to read prompt file {:?}: {}",
            prompt_file, e
        ))
    })?;

    let definition = parse_prompt(&contents, &prompt_file.display().to_string())?;
    tracing::info!("Loaded prompt: {} ({})", definition.id, definition.title);

    Ok(definition)
}

/// Return a prompt compiled into the binary.
pub fn builtin_prompt(prompt_id: &str) -> AppResult<PromptDefinition> {
    match prompt_id {
        SYSTEM_PROMPT_ID => parse_prompt(BUILTIN_SYSTEM_PROMPT, "built-in"),
        other => Err(AppError::Prompt(format!("No built-in prompt: {}", other))),
    }
}

/// Load a workspace override if one exists, otherwise the built-in prompt.
pub fn resolve_prompt(prompts_dir: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    if prompts_dir.join(format!("{}.yml", prompt_id)).exists() {
        load_prompt(prompts_dir, prompt_id)
    } else {
        tracing::debug!("Using built-in prompt: {}", prompt_id);
        builtin_prompt(prompt_id)
    }
}

fn parse_prompt(contents: &str, source: &str) -> AppResult<PromptDefinition> {
    let definition: PromptDefinition = serde_yaml::from_str(contents).map_err(|e| {
        AppError::Prompt(format!("Failed to parse prompt YAML {}: {}", source, e))
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

    // Validate API version format (simple check)
    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn create_test_prompt(dir: &Path, id: &str, valid: bool) -> PathBuf {
        fs::create_dir_all(dir).unwrap();

        let content = if valid {
            format!(
                r#"
id: {}
title: "Test Prompt"
apiVersion: "1.0"
template: "You work at {{{{businessName}}}}."
"#,
                id
            )
        } else {
            "invalid: yaml: content:".to_string()
        };

        let file_path = dir.join(format!("{}.yml", id));
        fs::write(&file_path, content).unwrap();
        file_path
    }

    #[test]
    fn test_load_valid_prompt() {
        let temp_dir = TempDir::new().unwrap();
        create_test_prompt(temp_dir.path(), "test.prompt", true);

        let prompt = load_prompt(temp_dir.path(), "test.prompt").unwrap();
        assert_eq!(prompt.id, "test.prompt");
        assert_eq!(prompt.template, "You work at {{businessName}}.");
    }

    #[test]
    fn test_load_nonexistent_prompt() {
        let temp_dir = TempDir::new().unwrap();
        assert!(load_prompt(temp_dir.path(), "nonexistent").is_err());
    }

    #[test]
    fn test_load_invalid_yaml() {
        let temp_dir = TempDir::new().unwrap();
        create_test_prompt(temp_dir.path(), "invalid", false);
        assert!(load_prompt(temp_dir.path(), "invalid").is_err());
    }

    #[test]
    fn test_builtin_system_prompt() {
        let prompt = builtin_prompt(SYSTEM_PROMPT_ID).unwrap();
        assert_eq!(prompt.id, SYSTEM_PROMPT_ID);
        assert!(prompt.template.contains("{{businessName}} winery"));
        assert!(prompt.template.ends_with("real-time information."));
        assert!(builtin_prompt("unknown").is_err());
    }

    #[test]
    fn test_resolve_prefers_workspace_override() {
        let temp_dir = TempDir::new().unwrap();
        let fallback = resolve_prompt(temp_dir.path(), SYSTEM_PROMPT_ID).unwrap();
        assert_eq!(fallback.title, "Winery concierge system instruction");

        create_test_prompt(temp_dir.path(), SYSTEM_PROMPT_ID, true);
        let overridden = resolve_prompt(temp_dir.path(), SYSTEM_PROMPT_ID).unwrap();
        assert_eq!(overridden.title, "Test Prompt");
    }

    #[test]
    fn test_rejects_bad_api_version() {
        let yaml = "id: a\ntitle: A\napiVersion: \"1\"\ntemplate: x\n";
        let err = parse_prompt(yaml, "inline").unwrap_err();
        assert!(err.to_string().contains("Invalid apiVersion"));
    }
}
