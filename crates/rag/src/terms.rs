//! Search term extraction from rewriter output.
//!
//! The rewriter is asked for a bracketed list literal such as
//! `['pizza places', 'crust']`, usually wrapped in some chatter. JSON output
//! is accepted first; the bracket scan is the compatibility path.

use crate::types::{RewrittenQuery, TermSource};
use reviewlens_core::AppError;
use serde::Deserialize;
use thiserror::Error;

/// Why rewriter output could not be turned into search terms.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TermParseError {
    #[error("no '[' in rewriter output")]
    MissingOpenBracket,

    #[error("no ']' in rewriter output")]
    MissingCloseBracket,

    #[error("first ']' appears before first '['")]
    ClosedBeforeOpen,

    #[error("term list is empty")]
    Empty,
}

impl From<TermParseError> for AppError {
    fn from(err: TermParseError) -> Self {
        AppError::RewriteParse(err.to_string())
    }
}

/// Return the text strictly between the first `[` and the first `]`.
///
/// Quoting and commas inside are preserved verbatim.
pub fn extract_bracketed(raw: &str) -> Result<&str, TermParseError> {
    match (raw.find('['), raw.find(']')) {
        (None, _) => Err(TermParseError::MissingOpenBracket),
        (Some(_), None) => Err(TermParseError::MissingCloseBracket),
        (Some(start), Some(end)) if end < start => Err(TermParseError::ClosedBeforeOpen),
        (Some(start), Some(end)) => Ok(&raw[start + 1..end]),
    }
}

/// Split list-literal contents into terms.
///
/// Commas inside quotes do not split. Surrounding quotes and whitespace are
/// stripped and empty entries dropped.
pub fn split_terms(inner: &str) -> Vec<String> {
    let mut terms = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for c in inner.chars() {
        match (quote, c) {
            (None, '\'' | '"') => {
                quote = Some(c);
                current.push(c);
            }
            (Some(q), _) if c == q => {
                quote = None;
                current.push(c);
            }
            (None, ',') => {
                push_term(&mut terms, &current);
                current.clear();
            }
            _ => current.push(c),
        }
    }
    push_term(&mut terms, &current);

    terms
}

fn push_term(terms: &mut Vec<String>, piece: &str) {
    let trimmed = piece.trim();
    let unquoted = ['\'', '"']
        .iter()
        .find_map(|q| {
            trimmed
                .strip_prefix(*q)
                .and_then(|rest| rest.strip_suffix(*q))
        })
        .unwrap_or(trimmed)
        .trim();

    if !unquoted.is_empty() {
        terms.push(unquoted.to_string());
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StructuredTerms {
    Object { terms: Vec<String> },
    List(Vec<String>),
}

fn parse_structured(raw: &str) -> Option<Vec<String>> {
    let terms = match serde_json::from_str::<StructuredTerms>(raw.trim()).ok()? {
        StructuredTerms::Object { terms } | StructuredTerms::List(terms) => terms,
    };

    let terms: Vec<String> = terms
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();

    (!terms.is_empty()).then_some(terms)
}

/// Turn rewriter output into a `RewrittenQuery`.
///
/// The search text is the extracted terms joined by `", "`.
pub fn parse_rewrite(raw: &str) -> Result<RewrittenQuery, TermParseError> {
    if let Some(terms) = parse_structured(raw) {
        return Ok(RewrittenQuery {
            raw: raw.to_string(),
            search_text: terms.join(", "),
            terms,
            source: TermSource::Structured,
        });
    }

    let inner = extract_bracketed(raw)?;
    let terms = split_terms(inner);
    if terms.is_empty() {
        return Err(TermParseError::Empty);
    }

    Ok(RewrittenQuery {
        raw: raw.to_string(),
        search_text: terms.join(", "),
        terms,
        source: TermSource::Bracketed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_preserves_inner_text_verbatim() {
        assert_eq!(
            extract_bracketed("Sure! ['pizza places', 'crust']").unwrap(),
            "'pizza places', 'crust'"
        );
        assert_eq!(extract_bracketed("Here you go: ['nachos']").unwrap(), "'nachos'");
    }

    #[test]
    fn test_extract_uses_first_brackets() {
        assert_eq!(extract_bracketed("['a'] and ['b']").unwrap(), "'a'");
        assert_eq!(extract_bracketed("[]").unwrap(), "");
    }

    #[test]
    fn test_extract_errors() {
        assert_eq!(
            extract_bracketed("pizza, crust"),
            Err(TermParseError::MissingOpenBracket)
        );
        assert_eq!(
            extract_bracketed("['pizza'"),
            Err(TermParseError::MissingCloseBracket)
        );
        assert_eq!(
            extract_bracketed("oops] ['pizza']"),
            Err(TermParseError::ClosedBeforeOpen)
        );
    }

    #[test]
    fn test_split_terms() {
        assert_eq!(
            split_terms("'pizza places', 'crust'"),
            vec!["pizza places".to_string(), "crust".to_string()]
        );
        assert_eq!(
            split_terms(r#""mac, cheese", 'wait time' ,, "#),
            vec!["mac, cheese".to_string(), "wait time".to_string()]
        );
        assert_eq!(split_terms("loud, music"), vec!["loud".to_string(), "music".to_string()]);
        assert!(split_terms("  ").is_empty());
    }

    #[test]
    fn test_split_terms_keeps_apostrophes_inside_double_quotes() {
        assert_eq!(split_terms(r#""chef's special""#), vec!["chef's special".to_string()]);
    }

    #[test]
    fn test_parse_rewrite_bracketed() {
        let query = parse_rewrite("Here you go: ['nachos']").unwrap();
        assert_eq!(query.source, TermSource::Bracketed);
        assert_eq!(query.terms, vec!["nachos".to_string()]);
        assert_eq!(query.search_text, "nachos");
        assert_eq!(query.raw, "Here you go: ['nachos']");

        let query = parse_rewrite("['background music', 'loud']").unwrap();
        assert_eq!(query.search_text, "background music, loud");
    }

    #[test]
    fn test_parse_rewrite_structured() {
        let query = parse_rewrite(r#"{"terms": ["patio", "outdoor seating"]}"#).unwrap();
        assert_eq!(query.source, TermSource::Structured);
        assert_eq!(query.search_text, "patio, outdoor seating");

        let query = parse_rewrite(r#" ["wait time"] "#).unwrap();
        assert_eq!(query.source, TermSource::Structured);
        assert_eq!(query.terms, vec!["wait time".to_string()]);
    }

    #[test]
    fn test_parse_rewrite_empty_list() {
        assert_eq!(parse_rewrite("Nothing to search: []"), Err(TermParseError::Empty));
        assert_eq!(parse_rewrite("[' ', '']"), Err(TermParseError::Empty));
    }

    #[test]
    fn test_parse_error_converts_to_app_error() {
        let err: AppError = TermParseError::MissingOpenBracket.into();
        assert!(matches!(err, AppError::RewriteParse(_)));
    }
}
