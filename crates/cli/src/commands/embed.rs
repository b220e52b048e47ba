//! Embed command handler.
//!
//! Prints the vector the embedding deployment returns for a text, to check
//! the deployment is reachable and matches the index dimension.

use clap::Args;
use reviewlens_core::{config::AppConfig, AppError, AppResult};
use reviewlens_llm::{create_embedding_client, EmbeddingClient};

/// Print the embedding of a text
#[derive(Args, Debug)]
pub struct EmbedCommand {
    /// Text to embed
    pub text: String,

    /// Print the full vector as JSON
    #[arg(long)]
    pub json: bool,
}

impl EmbedCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing embed command");

        if self.text.trim().is_empty() {
            return Err(AppError::InvalidInput("Text cannot be empty".to_string()));
        }

        let client = create_embedding_client(&config.llm)?;
        let vector = client.embed(&self.text).await?;

        if self.json {
            println!("{}", serde_json::to_string(&vector)?);
        } else {
            let preview: Vec<String> = vector.iter().take(8).map(|v| format!("{:.5}", v)).collect();
            println!("Model: {}", client.model_name());
            println!("Dimensions: {}", vector.len());
            println!("Vector: [{}{}]", preview.join(", "), if vector.len() > 8 { ", ..." } else { "" });
        }

        Ok(())
    }
}
