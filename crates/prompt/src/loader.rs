//! Prompt loader for YAML prompt definitions.

use crate::template::PromptTemplate;
use crate::types::PromptDefinition;
use docchat_core::{AppError, AppResult};
use std::path::Path;

/// Load a prompt definition from `path` and compile it.
///
/// # Example
/// ```no_run
/// use docchat_prompt::load_template;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let template = load_template(Path::new("prompts/strict.yml"))?;
/// println!("Loaded prompt: {}", template.id());
/// # Ok(())
/// # }
/// ```
pub fn load_template(path: &Path) -> AppResult<PromptTemplate> {
    tracing::debug!("Loading prompt from: {:?}", path);

    if !path.exists() {
        return Err(AppError::Prompt(format!("Prompt file not found: {:?}", path)));
    }

    let contents = std::fs::read_to_string(path)
        .map_err(|e| AppError::Prompt(format!("Failed to read prompt file {:?}: {}", path, e)))?;

    let template = parse_template(&contents)
        .map_err(|e| AppError::Prompt(format!("{:?}: {}", path, e)))?;

    tracing::info!(prompt_id = template.id(), "Loaded prompt template");
    Ok(template)
}

/// Parse and compile a YAML prompt definition.
pub fn parse_template(yaml: &str) -> AppResult<PromptTemplate> {
    let definition: PromptDefinition = serde_yaml::from_str(yaml)
        .map_err(|e| AppError::Prompt(format!("Failed to parse prompt YAML: {}", e)))?;

    validate_definition(&definition)?;
    PromptTemplate::from_definition(&definition)
}

fn validate_definition(def: &PromptDefinition) -> AppResult<()> {
    if def.id.trim().is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.title.trim().is_empty() {
        return Err(AppError::Prompt("Prompt title cannot be empty".to_string()));
    }

    // A template that never sees the question cannot answer it.
    if !def.required_slots.iter().any(|slot| slot == "question") {
        return Err(AppError::Prompt(format!(
            "Prompt '{}' must require the 'question' slot",
            def.id
        )));
    }

    Ok(())
}
