//! Query text parsing
//!
//! Queries are sequences of case-folded alphanumeric tokens; everything
//! else separates terms. The evaluator stores the result and only ever
//! iterates it to look up postings.

/// Split a query into lowercased terms
pub fn parse(query: &str) -> Vec<String> {
    query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(|token| token.to_lowercase())
        .collect()
}
