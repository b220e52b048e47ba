//! Review question answering over a hosted hybrid search index.
//!
//! A question is rewritten into search terms by a chat model, matching
//! reviews are retrieved with one hybrid (keyword + vector) query, and a
//! second chat call answers from the reviews that clear the relevance
//! threshold.
//!
//! # Example
//! ```no_run
//! use reviewlens_core::AppConfig;
//! use reviewlens_rag::{ReviewPipeline, Session};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::load()?;
//! let pipeline = ReviewPipeline::from_config(&config)?;
//! let session = Session::new();
//! let outcome = pipeline
//!     .ask(&session, "How do customers like our nachos?", Some("MX001"))
//!     .await?;
//! println!("{}", outcome.answer);
//! # Ok(())
//! # }
//! ```

pub mod pipeline;
pub mod retriever;
pub mod rewriter;
pub mod search;
pub mod session;
pub mod synthesizer;
pub mod terms;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use pipeline::ReviewPipeline;
pub use retriever::HybridRetriever;
pub use rewriter::QueryRewriter;
pub use search::{AzureSearchClient, SearchBackend, SearchRequest, VectorQuery};
pub use session::{SecretResolver, Session, SessionState, StaticSecretResolver};
pub use synthesizer::AnswerSynthesizer;
pub use terms::{extract_bracketed, parse_rewrite, split_terms, TermParseError};
pub use types::{AskOutcome, Retrieval, ReviewRecord, RewrittenQuery, TermSource};
