//! Model integration crate for reviewlens.
//!
//! Provider-agnostic access to chat completions and text embeddings through
//! trait objects, so the pipeline can run against hosted services or test
//! doubles alike.
//!
//! # Providers
//! - **Azure OpenAI**: deployment-scoped chat and embeddings (default)
//! - **OpenAI**: public or OpenAI-compatible chat completions
//! - **Ollama**: local runtime
//!
//! # Example
//! ```no_run
//! use reviewlens_llm::{ChatRequest, LlmClient, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new();
//! let request = ChatRequest::new("llama3.2").with_user("Hello, world!");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod embeddings;
pub mod factory;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{ChatMessage, ChatRequest, ChatResponse, ChatRole, LlmClient, LlmUsage};
pub use embeddings::{AzureEmbeddingClient, EmbeddingClient};
pub use factory::{create_client, create_embedding_client, http_client};
pub use providers::{AzureOpenAiClient, OllamaClient, OpenAiClient};
pub use types::ProviderType;
