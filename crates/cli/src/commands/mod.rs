//! Command handlers for the reviewlens CLI.

pub mod ask;
pub mod chat;
pub mod embed;
pub mod prompts;

// Re-export command types for convenience
pub use ask::AskCommand;
pub use chat::ChatCommand;
pub use embed::EmbedCommand;
pub use prompts::PromptsCommand;
