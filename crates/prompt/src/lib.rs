//! Prompt system for reviewlens.
//!
//! This crate provides structured prompt management with:
//! - YAML-based prompt definitions, built in or overridden per workspace
//! - Handlebars rendering of both the system instruction and the user turn

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use loader::{
    builtin_prompt, list_prompts, load_prompt, REWRITE_PROMPT_ID, SYNTHESIZE_PROMPT_ID,
};
pub use types::{
    BuiltPrompt, BuiltPromptMetadata, PromptDefinition, PromptOutputSpec, PromptParameters,
};
