//! Retrieval engine: ranked, citation-friendly search over the corpus
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::corpus::Corpus;
use crate::errors::{AgentError, Result};
use crate::retrieval::index::DocumentIndex;

/// Default number of documents returned by a search
pub const DEFAULT_TOP_K: usize = 3;

/// Default snippet length in characters
pub const DEFAULT_SNIPPET_CHARS: usize = 240;

/// Search parameters for retrieval
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParams {
    /// Results returned when the caller gives no `k`
    pub top_k: usize,
    /// Snippet length in characters
    pub snippet_chars: usize,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            snippet_chars: DEFAULT_SNIPPET_CHARS,
        }
    }
}

/// One search result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub title: String,
    pub score: f64,
    pub snippet: String,
}

/// Document listing entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub id: String,
    pub title: String,
}

/// Retrieval engine over an explicitly built index
#[derive(Debug, Clone)]
pub struct RetrievalEngine {
    index: Arc<DocumentIndex>,
    corpus: Arc<Corpus>,
    params: SearchParams,
}

impl RetrievalEngine {
    /// Create engine from an index and the corpus it was built from
    pub fn new(index: Arc<DocumentIndex>, corpus: Arc<Corpus>) -> Result<Self> {
        Self::with_params(index, corpus, SearchParams::default())
    }

    /// Create with custom default parameters
    pub fn with_params(
        index: Arc<DocumentIndex>,
        corpus: Arc<Corpus>,
        params: SearchParams,
    ) -> Result<Self> {
        let same_corpus = index.len() == corpus.len()
            && index
                .doc_ids()
                .iter()
                .zip(corpus.documents())
                .all(|(id, doc)| *id == doc.id);
        if !same_corpus {
            return Err(AgentError::CorpusLoad(
                "index was built from a different corpus".to_string(),
            ));
        }

        Ok(Self {
            index,
            corpus,
            params,
        })
    }

    /// Build the index and the engine in one step
    pub fn build(corpus: Corpus) -> Result<Self> {
        Self::build_with_params(corpus, SearchParams::default())
    }

    /// Build with custom default parameters
    pub fn build_with_params(corpus: Corpus, params: SearchParams) -> Result<Self> {
        let index = Arc::new(DocumentIndex::build(&corpus)?);
        Self::with_params(index, Arc::new(corpus), params)
    }

    /// Top-k documents for `query`, with snippets
    pub fn search(&self, query: &str, k: usize) -> Vec<SearchHit> {
        self.index
            .query(query, k)
            .into_iter()
            .filter_map(|scored| {
                self.corpus.get(scored.position).map(|doc| SearchHit {
                    id: doc.id.clone(),
                    title: doc.title.clone(),
                    score: scored.score,
                    snippet: snippet(&doc.text, self.params.snippet_chars),
                })
            })
            .collect()
    }

    /// Search with the default `k`
    pub fn search_default(&self, query: &str) -> Vec<SearchHit> {
        self.search(query, self.params.top_k)
    }

    /// All documents in corpus order
    pub fn list_documents(&self) -> Vec<DocumentSummary> {
        self.corpus
            .documents()
            .iter()
            .map(|doc| DocumentSummary {
                id: doc.id.clone(),
                title: doc.title.clone(),
            })
            .collect()
    }

    pub fn index(&self) -> &Arc<DocumentIndex> {
        &self.index
    }

    pub fn corpus(&self) -> &Arc<Corpus> {
        &self.corpus
    }

    pub fn default_params(&self) -> &SearchParams {
        &self.params
    }
}

/// First `max_chars` characters of `text`, with an ellipsis when cut
pub fn snippet(text: &str, max_chars: usize) -> String {
    let mut chars = text.char_indices();
    match chars.nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::Document;

    fn engine() -> RetrievalEngine {
        RetrievalEngine::build(Corpus::new(vec![
            Document::new("doc1", "revenue increased due to higher sales").with_title("Results"),
            Document::new("doc2", "balance sheet shows total assets"),
        ]))
        .unwrap()
    }

    #[test]
    fn test_search_params_default() {
        let params = SearchParams::default();
        assert_eq!(params.top_k, 3);
        assert_eq!(params.snippet_chars, 240);
    }

    #[test]
    fn test_search_returns_hits_with_metadata() {
        let hits = engine().search("sales revenue", 1);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "doc1");
        assert_eq!(hits[0].title, "Results");
        assert_eq!(hits[0].snippet, "revenue increased due to higher sales");
        assert!(hits[0].score > 0.0);
    }

    #[test]
    fn test_list_documents_in_corpus_order() {
        let docs = engine().list_documents();
        let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["doc1", "doc2"]);
    }

    #[test]
    fn test_snippet_truncates_on_char_boundary() {
        assert_eq!(snippet("abcdef", 3), "abc...");
        assert_eq!(snippet("abc", 3), "abc");
        assert_eq!(snippet("zürich", 2), "zü...");
        assert_eq!(snippet("", 5), "");
    }

    #[test]
    fn test_mismatched_index_is_rejected() {
        let corpus_a = Corpus::new(vec![Document::new("a", "x")]);
        let corpus_b = Corpus::new(vec![Document::new("b", "x")]);
        let index = Arc::new(DocumentIndex::build(&corpus_a).unwrap());

        let result = RetrievalEngine::new(index, Arc::new(corpus_b));
        assert!(matches!(result, Err(AgentError::CorpusLoad(_))));
    }

    #[test]
    fn test_shared_index_across_threads() {
        let engine = Arc::new(engine());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let engine = Arc::clone(&engine);
                std::thread::spawn(move || engine.search("total assets", 1)[0].id.clone())
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), "doc2");
        }
    }
}
