//! Answer synthesis over retrieved reviews.

use crate::types::{label_generation_error, ReviewRecord};
use reviewlens_core::AppResult;
use reviewlens_llm::{ChatRequest, LlmClient};
use reviewlens_prompt::{build_prompt, PromptDefinition};
use serde::Serialize;
use std::sync::Arc;

#[derive(Serialize)]
struct ReviewContext<'a> {
    rank: usize,
    review_id: &'a str,
    content: &'a str,
    location: Option<&'a str>,
    date: Option<&'a str>,
}

#[derive(Serialize)]
struct SynthesisContext<'a> {
    question: &'a str,
    sentiment: bool,
    reviews: Vec<ReviewContext<'a>>,
    alternatives: Vec<ReviewContext<'a>>,
}

fn ranked(reviews: &[ReviewRecord]) -> Vec<ReviewContext<'_>> {
    reviews
        .iter()
        .enumerate()
        .map(|(i, review)| ReviewContext {
            rank: i + 1,
            review_id: &review.review_id,
            content: &review.content,
            location: review.location.as_deref(),
            date: review.date.as_deref(),
        })
        .collect()
}

/// Produces the owner-facing answer from the question and its evidence.
pub struct AnswerSynthesizer {
    client: Arc<dyn LlmClient>,
    model: String,
    prompt: PromptDefinition,
    temperature: f32,
    sentiment: bool,
}

impl AnswerSynthesizer {
    pub fn new(
        client: Arc<dyn LlmClient>,
        model: impl Into<String>,
        prompt: PromptDefinition,
        temperature: f32,
        sentiment: bool,
    ) -> Self {
        Self {
            client,
            model: model.into(),
            prompt,
            temperature,
            sentiment,
        }
    }

    /// Build the chat request. Reviews appear in the order given, numbered
    /// from 1. `alternatives` are only rendered when `reviews` is empty.
    pub fn build_request(
        &self,
        question: &str,
        reviews: &[ReviewRecord],
        alternatives: &[ReviewRecord],
    ) -> AppResult<ChatRequest> {
        let alternatives: &[ReviewRecord] = if reviews.is_empty() { alternatives } else { &[] };
        let context = SynthesisContext {
            question,
            sentiment: self.sentiment,
            reviews: ranked(reviews),
            alternatives: ranked(alternatives),
        };

        let built = build_prompt(&self.prompt, &context)?;

        let mut request = ChatRequest::new(&self.model);
        if let Some(system) = built.system {
            request = request.with_system(system);
        }
        request = request
            .with_user(built.user)
            .with_temperature(self.temperature);
        if let Some(max_tokens) = built.metadata.parameters.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }

        Ok(request)
    }

    /// Answer `question` from `reviews`. The model's text is returned
    /// unmodified; an empty review set still produces an answer.
    pub async fn synthesize(
        &self,
        question: &str,
        reviews: &[ReviewRecord],
        alternatives: &[ReviewRecord],
    ) -> AppResult<String> {
        let request = self.build_request(question, reviews, alternatives)?;
        tracing::debug!(
            "Synthesizing answer from {} review(s) with {}",
            reviews.len(),
            self.client.provider_name()
        );

        let response = self
            .client
            .complete(&request)
            .await
            .map_err(|e| label_generation_error("answer synthesis", e))?;

        tracing::debug!(
            "Answer used {} token(s)",
            response.usage.total_tokens
        );
        Ok(response.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::doubles::{review, ScriptedLlm};
    use reviewlens_core::AppError;
    use reviewlens_llm::ChatRole;
    use reviewlens_prompt::{builtin_prompt, SYNTHESIZE_PROMPT_ID};

    fn synthesizer(llm: Arc<ScriptedLlm>, sentiment: bool) -> AnswerSynthesizer {
        AnswerSynthesizer::new(
            llm,
            "gpt-4",
            builtin_prompt(SYNTHESIZE_PROMPT_ID).unwrap(),
            0.5,
            sentiment,
        )
    }

    #[test]
    fn test_request_numbers_reviews_in_order() {
        let llm = Arc::new(ScriptedLlm::new(vec![]));
        let reviews = vec![
            review("r1", "MX001", "Best nachos in town", 0.05),
            review("r2", "MX001", "Queso could be warmer", 0.03),
        ];

        let request = synthesizer(llm, true)
            .build_request("How are the nachos?", &reviews, &[])
            .unwrap();

        assert_eq!(request.temperature, Some(0.5));
        assert_eq!(request.messages[0].role, ChatRole::System);
        assert!(request.messages[0].content.contains("percentages"));

        let user = &request.messages[1].content;
        assert!(user.starts_with("The user asked: How are the nachos?"));
        let first = user.find("Customer Reviews 1:\nBest nachos in town").unwrap();
        let second = user.find("Customer Reviews 2:\nQueso could be warmer").unwrap();
        assert!(first < second);
        assert!(!user.contains("Closest Review"));
    }

    #[test]
    fn test_sentiment_instruction_is_optional() {
        let llm = Arc::new(ScriptedLlm::new(vec![]));
        let request = synthesizer(llm, false)
            .build_request("Is it loud?", &[], &[])
            .unwrap();
        assert!(!request.messages[0].content.contains("percentages"));
    }

    #[test]
    fn test_empty_reviews_render_placeholder() {
        let llm = Arc::new(ScriptedLlm::new(vec![]));
        let request = synthesizer(llm, true)
            .build_request("Is the patio nice?", &[], &[])
            .unwrap();
        assert!(request.messages[1]
            .content
            .contains("No customer reviews matched this question."));
    }

    #[test]
    fn test_alternatives_only_without_reviews() {
        let llm = Arc::new(ScriptedLlm::new(vec![]));
        let synthesizer = synthesizer(llm, true);
        let close = vec![review("r9", "MX001", "Salsa was mild", 0.01)];

        let request = synthesizer.build_request("How is the salsa?", &[], &close).unwrap();
        let user = &request.messages[1].content;
        assert!(user.contains("Next closest reviews"));
        assert!(user.contains("Closest Review 1:\nSalsa was mild"));
        assert!(!user.contains("No customer reviews matched"));

        let kept = vec![review("r1", "MX001", "Great salsa", 0.04)];
        let request = synthesizer.build_request("How is the salsa?", &kept, &close).unwrap();
        assert!(!request.messages[1].content.contains("Salsa was mild"));
    }

    #[test]
    fn test_review_text_is_not_escaped() {
        let llm = Arc::new(ScriptedLlm::new(vec![]));
        let reviews = vec![review("r1", "MX001", "Fish & chips <3", 0.05)];
        let request = synthesizer(llm, true)
            .build_request("Fish?", &reviews, &[])
            .unwrap();
        assert!(request.messages[1].content.contains("Fish & chips <3"));
    }

    #[tokio::test]
    async fn test_answer_returned_verbatim() {
        let answer = "  Customers love the nachos (80% positive).\n\nReviews used: 1\n";
        let llm = Arc::new(ScriptedLlm::new(vec![Ok(answer)]));
        let reviews = vec![review("r1", "MX001", "Best nachos in town", 0.05)];

        let result = synthesizer(llm.clone(), true)
            .synthesize("How are the nachos?", &reviews, &[])
            .await
            .unwrap();

        assert_eq!(result, answer);
        assert_eq!(llm.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_generation_failure_is_labelled() {
        let llm = Arc::new(ScriptedLlm::new(vec![Err("timeout")]));
        let err = synthesizer(llm, true)
            .synthesize("Anything?", &[], &[])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Generation(_)));
        assert!(err.to_string().contains("answer synthesis"));
    }
}
