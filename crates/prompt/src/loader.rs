//! Prompt loader for built-in and workspace prompt definitions.

use crate::builder::check_templates;
use crate::types::PromptDefinition;
use reviewlens_core::{AppError, AppResult};
use std::path::{Path, PathBuf};

/// Query rewriting prompt.
pub const REWRITE_PROMPT_ID: &str = "reviews.rewrite";

/// Answer synthesis prompt.
pub const SYNTHESIZE_PROMPT_ID: &str = "reviews.synthesize";

const BUILTIN_PROMPTS: [(&str, &str); 2] = [
    (REWRITE_PROMPT_ID, include_str!("../prompts/reviews.rewrite.yml")),
    (
        SYNTHESIZE_PROMPT_ID,
        include_str!("../prompts/reviews.synthesize.yml"),
    ),
];

/// Load a prompt definition by ID.
///
/// A workspace file `.reviewlens/prompts/<id>.yml` overrides the built-in
/// definition of the same ID.
///
/// # Example
/// ```no_run
/// use reviewlens_prompt::load_prompt;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompt = load_prompt(Path::new("."), "reviews.rewrite")?;
/// println!("Loaded prompt: {}", prompt.title);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(workspace_path: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    let prompt_file = prompts_dir(workspace_path).join(format!("{}.yml", prompt_id));

    if prompt_file.exists() {
        tracing::debug!("Loading prompt from: {:?}", prompt_file);

        let contents = std::fs::read_to_string(&prompt_file).map_err(|e| {
            AppError::Prompt(format!(
                "Failed to read prompt file {:?}: {}",
                prompt_file, e
            ))
        })?;

        let definition = parse_prompt(&contents, &format!("{:?}", prompt_file))?;
        if definition.id != prompt_id {
            return Err(AppError::Prompt(format!(
                "Prompt file {:?} declares id '{}', expected '{}'",
                prompt_file, definition.id, prompt_id
            )));
        }

        tracing::info!("Loaded workspace prompt: {} ({})", definition.id, definition.title);
        return Ok(definition);
    }

    let source = builtin_source(prompt_id)
        .ok_or_else(|| AppError::Prompt(format!("Unknown prompt: {}", prompt_id)))?;

    let definition = parse_prompt(source, "built-in")?;
    tracing::debug!("Loaded built-in prompt: {}", definition.id);
    Ok(definition)
}

/// Load a built-in prompt, ignoring workspace overrides.
pub fn builtin_prompt(prompt_id: &str) -> AppResult<PromptDefinition> {
    let source = builtin_source(prompt_id)
        .ok_or_else(|| AppError::Prompt(format!("Unknown prompt: {}", prompt_id)))?;
    parse_prompt(source, "built-in")
}

/// List all available prompt IDs: built-ins plus workspace files.
pub fn list_prompts(workspace_path: &Path) -> AppResult<Vec<String>> {
    let mut prompt_ids: Vec<String> = BUILTIN_PROMPTS
        .iter()
        .map(|(id, _)| id.to_string())
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
                    prompt_ids.push(stem.to_string());
                }
            }
        }
    }

    prompt_ids.sort();
    prompt_ids.dedup();
    Ok(prompt_ids)
}

fn prompts_dir(workspace_path: &Path) -> PathBuf {
    workspace_path.join(".reviewlens/prompts")
}

fn builtin_source(prompt_id: &str) -> Option<&'static str> {
    BUILTIN_PROMPTS
        .iter()
        .find(|(id, _)| *id == prompt_id)
        .map(|(_, source)| *source)
}

fn parse_prompt(contents: &str, origin: &str) -> AppResult<PromptDefinition> {
    let definition: PromptDefinition = serde_yaml::from_str(contents).map_err(|e| {
        AppError::Prompt(format!("Failed to parse prompt YAML {}: {}", origin, e))
    })?;

    validate_prompt(&definition)?;
    check_templates(&definition)?;

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

    if let Some(t) = def.parameters.temperature {
        if !(0.0..=2.0).contains(&t) {
            return Err(AppError::Prompt(format!(
                "Temperature {} for prompt '{}' is outside 0.0-2.0",
                t, def.id
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_prompt(dir: &Path, id: &str, body: &str) -> PathBuf {
        let prompts_dir = dir.join(".reviewlens/prompts");
        fs::create_dir_all(&prompts_dir).unwrap();
        let file_path = prompts_dir.join(format!("{}.yml", id));
        fs::write(&file_path, body).unwrap();
        file_path
    }

    fn valid_prompt(id: &str) -> String {
        format!(
            r#"
id: {}
title: "Custom Prompt"
apiVersion: "1.0"
createdBy: test
system: "Custom system"
template: "Custom: {{{{question}}}}"
output:
  format: markdown
"#,
            id
        )
    }

    #[test]
    fn test_builtins_parse() {
        let rewrite = builtin_prompt(REWRITE_PROMPT_ID).unwrap();
        assert!(rewrite.system.as_deref().unwrap().contains("['term1', 'term2']"));
        assert_eq!(rewrite.parameters.temperature, None);

        let synth = builtin_prompt(SYNTHESIZE_PROMPT_ID).unwrap();
        assert!(synth.template.contains("The user asked:"));
        assert_eq!(synth.parameters.temperature, Some(0.5));
    }

    #[test]
    fn test_load_falls_back_to_builtin() {
        let temp_dir = TempDir::new().unwrap();
        let prompt = load_prompt(temp_dir.path(), REWRITE_PROMPT_ID).unwrap();
        assert_eq!(prompt.id, REWRITE_PROMPT_ID);
    }

    #[test]
    fn test_workspace_override_wins() {
        let temp_dir = TempDir::new().unwrap();
        write_prompt(temp_dir.path(), REWRITE_PROMPT_ID, &valid_prompt(REWRITE_PROMPT_ID));

        let prompt = load_prompt(temp_dir.path(), REWRITE_PROMPT_ID).unwrap();
        assert_eq!(prompt.title, "Custom Prompt");
        assert_eq!(prompt.template, "Custom: {{question}}");
    }

    #[test]
    fn test_override_with_mismatched_id() {
        let temp_dir = TempDir::new().unwrap();
        write_prompt(temp_dir.path(), REWRITE_PROMPT_ID, &valid_prompt("something.else"));
        assert!(load_prompt(temp_dir.path(), REWRITE_PROMPT_ID).is_err());
    }

    #[test]
    fn test_load_nonexistent_prompt() {
        let temp_dir = TempDir::new().unwrap();
        assert!(load_prompt(temp_dir.path(), "nonexistent").is_err());
    }

    #[test]
    fn test_load_invalid_yaml() {
        let temp_dir = TempDir::new().unwrap();
        write_prompt(temp_dir.path(), "invalid", "invalid: yaml: content:");
        assert!(load_prompt(temp_dir.path(), "invalid").is_err());
    }

    #[test]
    fn test_rejects_out_of_range_temperature() {
        let temp_dir = TempDir::new().unwrap();
        let body = valid_prompt("hot").replace("output:", "parameters:\n  temperature: 3.5\noutput:");
        write_prompt(temp_dir.path(), "hot", &body);
        assert!(load_prompt(temp_dir.path(), "hot").is_err());
    }

    #[test]
    fn test_list_prompts() {
        let temp_dir = TempDir::new().unwrap();
        write_prompt(temp_dir.path(), "prompt1", &valid_prompt("prompt1"));
        write_prompt(temp_dir.path(), REWRITE_PROMPT_ID, &valid_prompt(REWRITE_PROMPT_ID));

        let prompts = list_prompts(temp_dir.path()).unwrap();
        assert_eq!(prompts.len(), 3);
        assert!(prompts.contains(&"prompt1".to_string()));
        assert!(prompts.contains(&REWRITE_PROMPT_ID.to_string()));
        assert!(prompts.contains(&SYNTHESIZE_PROMPT_ID.to_string()));
    }
}
