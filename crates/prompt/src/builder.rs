//! Prompt builder for rendering templates.

use crate::types::{BuiltPrompt, PromptDefinition};
use handlebars::Handlebars;
use reviewlens_core::{AppError, AppResult};
use serde::Serialize;

/// Build a prompt from a definition and template data.
///
/// Both the system instruction and the user template are rendered against
/// `data`. HTML escaping is disabled; review text is passed through as-is.
///
/// # Example
/// ```no_run
/// use reviewlens_prompt::{build_prompt, PromptDefinition};
///
/// # fn example(def: PromptDefinition) -> Result<(), Box<dyn std::error::Error>> {
/// let data = serde_json::json!({ "question": "How are the nachos?" });
/// let built = build_prompt(&def, &data)?;
/// println!("User prompt: {}", built.user);
/// # Ok(())
/// # }
/// ```
pub fn build_prompt<T: Serialize>(definition: &PromptDefinition, data: &T) -> AppResult<BuiltPrompt> {
    tracing::debug!("Building prompt: {}", definition.id);

    let handlebars = registry(definition)?;

    let system = match definition.system {
        Some(_) => Some(render(&handlebars, SYSTEM_TEMPLATE, data)?),
        None => None,
    };
    let user = render(&handlebars, USER_TEMPLATE, data)?;

    Ok(BuiltPrompt::new(
        system,
        user,
        definition.id.clone(),
        definition.parameters.clone(),
    ))
}

const SYSTEM_TEMPLATE: &str = "system";
const USER_TEMPLATE: &str = "user";

fn registry(definition: &PromptDefinition) -> AppResult<Handlebars<'static>> {
    let mut handlebars = Handlebars::new();

    // Disable HTML escaping for plain text
    handlebars.register_escape_fn(handlebars::no_escape);

    if let Some(ref system) = definition.system {
        handlebars
            .register_template_string(SYSTEM_TEMPLATE, system)
            .map_err(|e| {
                AppError::Prompt(format!(
                    "Failed to register system template for '{}': {}",
                    definition.id, e
                ))
            })?;
    }

    handlebars
        .register_template_string(USER_TEMPLATE, &definition.template)
        .map_err(|e| {
            AppError::Prompt(format!(
                "Failed to register template for '{}': {}",
                definition.id, e
            ))
        })?;

    Ok(handlebars)
}

fn render<T: Serialize>(handlebars: &Handlebars<'_>, name: &str, data: &T) -> AppResult<String> {
    handlebars
        .render(name, data)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))
}

/// Check that a definition's templates compile.
pub(crate) fn check_templates(definition: &PromptDefinition) -> AppResult<()> {
    registry(definition).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PromptOutputSpec, PromptParameters};
    use serde_json::json;

    fn create_test_definition(system: Option<&str>, template: &str) -> PromptDefinition {
        PromptDefinition {
            id: "test.prompt".to_string(),
            title: "Test".to_string(),
            api_version: "1.0".to_string(),
            created_by: "test".to_string(),
            system: system.map(str::to_string),
            template: template.to_string(),
            parameters: PromptParameters {
                temperature: Some(0.5),
                max_tokens: None,
            },
            output: PromptOutputSpec {
                format: "markdown".to_string(),
            },
        }
    }

    #[test]
    fn test_render_simple_template() {
        let def = create_test_definition(None, "Question: {{question}}");
        let built = build_prompt(&def, &json!({ "question": "Hello, world!" })).unwrap();
        assert_eq!(built.user, "Question: Hello, world!");
        assert!(built.system.is_none());
        assert_eq!(built.metadata.source_prompt_id, "test.prompt");
        assert_eq!(built.metadata.parameters.temperature, Some(0.5));
    }

    #[test]
    fn test_system_template_conditionals() {
        let def = create_test_definition(
            Some("Answer.{{#if sentiment}} Quantify sentiment.{{/if}}"),
            "{{question}}",
        );

        let with = build_prompt(&def, &json!({ "question": "q", "sentiment": true })).unwrap();
        assert_eq!(with.system.as_deref(), Some("Answer. Quantify sentiment."));

        let without = build_prompt(&def, &json!({ "question": "q", "sentiment": false })).unwrap();
        assert_eq!(without.system.as_deref(), Some("Answer."));
    }

    #[test]
    fn test_no_html_escaping() {
        let def = create_test_definition(None, "{{question}}");
        let built = build_prompt(&def, &json!({ "question": "Fish & chips <hot>" })).unwrap();
        assert_eq!(built.user, "Fish & chips <hot>");
    }

    #[test]
    fn test_each_over_reviews() {
        let def = create_test_definition(
            None,
            "{{#each reviews}}[{{this.rank}}] {{this.content}}\n{{/each}}",
        );
        let data = json!({
            "reviews": [
                { "rank": 1, "content": "Great nachos" },
                { "rank": 2, "content": "Soggy nachos" }
            ]
        });
        let built = build_prompt(&def, &data).unwrap();
        assert_eq!(built.user, "[1] Great nachos\n[2] Soggy nachos\n");
    }

    #[test]
    fn test_render_template_missing_variable() {
        let def = create_test_definition(None, "Question: {{missing}}");
        // Handlebars renders missing variables as empty string
        let built = build_prompt(&def, &json!({})).unwrap();
        assert_eq!(built.user, "Question: ");
    }

    #[test]
    fn test_invalid_template_is_prompt_error() {
        let def = create_test_definition(None, "{{#each reviews}}unterminated");
        assert!(matches!(
            build_prompt(&def, &json!({})),
            Err(AppError::Prompt(_))
        ));
    }
}
