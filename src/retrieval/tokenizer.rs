//! Term normalization shared by documents and queries

use std::collections::HashMap;

/// Lowercase `text` and split it on every non-alphanumeric character
///
/// ```
/// use docbuddy::retrieval::tokenize;
/// assert_eq!(tokenize("Net-income, 2024!"), vec!["net", "income", "2024"]);
/// ```
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Raw occurrence count of each token
pub fn term_counts(tokens: &[String]) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for token in tokens {
        *counts.entry(token.clone()).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_lowercases_and_splits() {
        assert_eq!(
            tokenize("Revenue increased due to HIGHER sales"),
            vec!["revenue", "increased", "due", "to", "higher", "sales"]
        );
    }

    #[test]
    fn test_tokenize_drops_punctuation_and_apostrophes() {
        assert_eq!(tokenize("company's  (EPS)"), vec!["company", "s", "eps"]);
    }

    #[test]
    fn test_tokenize_empty_and_symbols() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("--- ... !!!").is_empty());
    }

    #[test]
    fn test_tokenize_unicode() {
        assert_eq!(tokenize("Nestlé Zürich"), vec!["nestlé", "zürich"]);
    }

    #[test]
    fn test_term_counts() {
        let tokens = tokenize("cash flow and free cash flow");
        let counts = term_counts(&tokens);
        assert_eq!(counts["cash"], 2);
        assert_eq!(counts["flow"], 2);
        assert_eq!(counts["free"], 1);
        assert_eq!(counts.len(), 4);
    }
}
