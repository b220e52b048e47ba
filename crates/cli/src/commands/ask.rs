//! Ask command handler.
//!
//! Runs one question through the review pipeline and prints the answer.

use clap::Args;
use reviewlens_core::{config::AppConfig, AppError, AppResult};
use reviewlens_rag::{AskOutcome, ReviewPipeline, ReviewRecord, Session, StaticSecretResolver};
use std::path::PathBuf;

/// Ask one question about the reviews
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: Option<String>,

    /// Read the question from a file
    #[arg(short, long, conflicts_with = "question")]
    pub file: Option<PathBuf>,

    /// Restrict retrieval to one business
    #[arg(short, long)]
    pub business_id: Option<String>,

    /// Shared secret to log in with (required in gated mode)
    #[arg(long, env = "REVIEWLENS_SECRET", hide_env_values = true)]
    pub secret: Option<String>,

    /// Number of reviews to retrieve
    #[arg(long)]
    pub top_k: Option<usize>,

    /// Minimum relevance score for a review to be used
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Fail instead of searching with the question when no terms parse
    #[arg(long)]
    pub strict_terms: bool,

    /// Skip the sentiment breakdown
    #[arg(long)]
    pub no_sentiment: bool,

    /// Print the retrieved reviews after the answer
    #[arg(long)]
    pub show_reviews: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");

        let question = self.get_question()?;
        let config = self.apply_options(config.clone());
        let pipeline = ReviewPipeline::from_config(&config)?;

        let mut session = Session::new();
        if let Some(ref secret) = self.secret {
            let resolver = StaticSecretResolver::new(config.access.secrets.clone());
            session.login(&resolver, secret)?;
        }

        let outcome = pipeline
            .ask(&session, &question, self.business_id.as_deref())
            .await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&outcome_json(&outcome))?);
        } else {
            println!("{}", outcome.answer);
            if self.show_reviews {
                print_reviews(&outcome);
            }
        }

        Ok(())
    }

    /// Get the question text from the argument or the file.
    fn get_question(&self) -> AppResult<String> {
        let question = match (&self.question, &self.file) {
            (Some(question), _) => question.clone(),
            (None, Some(path)) => std::fs::read_to_string(path)?,
            (None, None) => {
                return Err(AppError::InvalidInput("No question provided".to_string()));
            }
        };
        Ok(question.trim().to_string())
    }

    fn apply_options(&self, mut config: AppConfig) -> AppConfig {
        if let Some(top_k) = self.top_k {
            config.retrieval.top_k = top_k;
        }
        if let Some(threshold) = self.threshold {
            config.retrieval.score_threshold = threshold;
        }
        if self.strict_terms {
            config.retrieval.strict_terms = true;
        }
        if self.no_sentiment {
            config.synthesis.sentiment = false;
        }
        config
    }
}

/// Structured form of an outcome for `--json`.
pub(crate) fn outcome_json(outcome: &AskOutcome) -> serde_json::Value {
    serde_json::json!({
        "answer": outcome.answer,
        "searchText": outcome.query.search_text,
        "terms": outcome.query.terms,
        "usedFallback": outcome.query.used_fallback(),
        "businessId": outcome.business_id,
        "reviews": outcome.reviews,
        "alternatives": outcome.alternatives,
    })
}

/// Print the evidence behind an answer.
pub(crate) fn print_reviews(outcome: &AskOutcome) {
    println!();
    if outcome.reviews.is_empty() {
        println!("Reviews: (none met the relevance threshold)");
    } else {
        println!("Reviews (search: {}):", outcome.query.search_text);
        for review in &outcome.reviews {
            print_review(review);
        }
    }

    if !outcome.alternatives.is_empty() {
        println!("Closest reviews:");
        for review in &outcome.alternatives {
            print_review(review);
        }
    }
}

fn print_review(review: &ReviewRecord) {
    println!(
        "- {} [{}] {} {} (score {:.4})",
        review.review_id,
        review.business_id,
        review.location.as_deref().unwrap_or("-"),
        review.date.as_deref().unwrap_or("-"),
        review.score
    );
    println!("  {}", review.content.trim());
}

#[cfg(test)]
mod tests {
    use super::*;
    use reviewlens_rag::{RewrittenQuery, TermSource};

    fn outcome() -> AskOutcome {
        AskOutcome {
            question: "How are the nachos?".to_string(),
            business_id: Some("MX001".to_string()),
            query: RewrittenQuery {
                raw: "['nachos']".to_string(),
                terms: vec!["nachos".to_string()],
                search_text: "nachos".to_string(),
                source: TermSource::Bracketed,
            },
            reviews: vec![ReviewRecord {
                review_id: "r1".to_string(),
                business_id: "MX001".to_string(),
                content: "Best nachos".to_string(),
                location: None,
                date: None,
                score: 0.05,
            }],
            alternatives: vec![],
            answer: "Loved.".to_string(),
        }
    }

    #[test]
    fn test_outcome_json_shape() {
        let json = outcome_json(&outcome());
        assert_eq!(json["answer"], "Loved.");
        assert_eq!(json["searchText"], "nachos");
        assert_eq!(json["usedFallback"], false);
        assert_eq!(json["businessId"], "MX001");
        assert_eq!(json["reviews"][0]["reviewId"], "r1");
        assert_eq!(json["alternatives"].as_array().map(Vec::len), Some(0));
    }

    #[test]
    fn test_options_override_config() {
        let cmd = AskCommand {
            question: Some("Nachos?".to_string()),
            file: None,
            business_id: None,
            secret: None,
            top_k: Some(3),
            threshold: Some(0.5),
            strict_terms: true,
            no_sentiment: true,
            show_reviews: false,
            json: false,
        };
        let config = cmd.apply_options(AppConfig::default());
        assert_eq!(config.retrieval.top_k, 3);
        assert_eq!(config.retrieval.score_threshold, 0.5);
        assert!(config.retrieval.strict_terms);
        assert!(!config.synthesis.sentiment);
    }

    #[test]
    fn test_missing_question_is_invalid_input() {
        let cmd = AskCommand {
            question: None,
            file: None,
            business_id: None,
            secret: None,
            top_k: None,
            threshold: None,
            strict_terms: false,
            no_sentiment: false,
            show_reviews: false,
            json: false,
        };
        assert!(matches!(cmd.get_question(), Err(AppError::InvalidInput(_))));
    }
}
