//! TF-IDF document index
//!
//! Built once from a corpus and read-only afterwards, so a single
//! `Arc<DocumentIndex>` can serve any number of concurrent queries.
//!
//! # Weighting
//!
//! ```text
//! tf(t, d)  = count of t in tokenize(title + " " + text)
//! df(t)     = |{ d : tf(t, d) > 0 }|
//! idf(t)    = ln((1 + N) / (1 + df(t))) + 1
//! w(t, d)   = tf(t, d) · idf(t)
//! score     = (q · d) / (‖q‖ · ‖d‖)      (0 when either norm is 0)
//! ```
//!
//! Query terms that never occur in the corpus are dropped: they carry no
//! weight and cannot change the ranking.
//!
//! Vectors are ordered maps so every sum runs over terms in the same order.
//! Identical documents therefore get bit-identical scores on every build.

use crate::corpus::Corpus;
use crate::errors::{AgentError, Result};
use crate::retrieval::tokenizer::{term_counts, tokenize};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

/// Sparse term → weight mapping in term order; absent terms weigh 0
pub type TermVector = BTreeMap<String, f64>;

/// One ranked document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredDocument {
    pub doc_id: String,
    /// Position of the document in the corpus
    pub position: usize,
    pub score: f64,
}

/// Smoothed inverse document frequency
///
/// Finite and strictly positive for every `df <= n_docs`.
pub fn smoothed_idf(n_docs: usize, df: usize) -> f64 {
    ((1.0 + n_docs as f64) / (1.0 + df as f64)).ln() + 1.0
}

/// Cosine similarity of two sparse vectors
///
/// Returns 0.0 when either vector has zero norm.
pub fn cosine(a: &TermVector, b: &TermVector) -> f64 {
    cosine_with_norms(a, norm(a), b, norm(b))
}

fn norm(v: &TermVector) -> f64 {
    v.values().map(|w| w * w).sum::<f64>().sqrt()
}

fn cosine_with_norms(a: &TermVector, a_norm: f64, b: &TermVector, b_norm: f64) -> f64 {
    if a_norm == 0.0 || b_norm == 0.0 {
        return 0.0;
    }

    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let dot: f64 = small
        .iter()
        .filter_map(|(term, w)| large.get(term).map(|other| w * other))
        .sum();

    // Rounding can push self-similarity a hair above 1
    (dot / (a_norm * b_norm)).clamp(0.0, 1.0)
}

/// Immutable TF-IDF index over a corpus
#[derive(Debug, Clone)]
pub struct DocumentIndex {
    idf: HashMap<String, f64>,
    doc_ids: Vec<String>,
    doc_vectors: Vec<TermVector>,
    doc_norms: Vec<f64>,
}

impl DocumentIndex {
    /// Build the index, failing fast on malformed corpora
    pub fn build(corpus: &Corpus) -> Result<Self> {
        let mut seen = HashSet::with_capacity(corpus.len());
        for (position, doc) in corpus.documents().iter().enumerate() {
            if doc.id.trim().is_empty() {
                return Err(AgentError::EmptyDocumentId { position });
            }
            if !seen.insert(doc.id.as_str()) {
                return Err(AgentError::DuplicateDocumentId { id: doc.id.clone() });
            }
        }

        let counts: Vec<HashMap<String, usize>> = corpus
            .documents()
            .iter()
            .map(|doc| term_counts(&tokenize(&doc.indexable_text())))
            .collect();

        let mut df: HashMap<&str, usize> = HashMap::new();
        for doc_counts in &counts {
            for term in doc_counts.keys() {
                *df.entry(term.as_str()).or_insert(0) += 1;
            }
        }

        let n_docs = corpus.len();
        let idf: HashMap<String, f64> = df
            .into_iter()
            .map(|(term, freq)| (term.to_string(), smoothed_idf(n_docs, freq)))
            .collect();

        let doc_vectors: Vec<TermVector> = counts
            .iter()
            .map(|doc_counts| {
                doc_counts
                    .iter()
                    .map(|(term, tf)| (term.clone(), *tf as f64 * idf[term]))
                    .collect()
            })
            .collect();
        let doc_norms = doc_vectors.iter().map(norm).collect();

        debug!(
            documents = n_docs,
            vocabulary = idf.len(),
            "built document index"
        );

        Ok(Self {
            idf,
            doc_ids: corpus.documents().iter().map(|d| d.id.clone()).collect(),
            doc_vectors,
            doc_norms,
        })
    }

    /// Weight a query the same way documents are weighted, dropping unseen terms
    pub fn query_vector(&self, text: &str) -> TermVector {
        term_counts(&tokenize(text))
            .into_iter()
            .filter_map(|(term, tf)| {
                self.idf
                    .get(&term)
                    .map(|idf| (term, tf as f64 * idf))
            })
            .collect()
    }

    /// Top-k documents by cosine similarity
    ///
    /// Ties keep corpus order. `k` larger than the corpus returns every document.
    pub fn query(&self, text: &str, k: usize) -> Vec<ScoredDocument> {
        let query = self.query_vector(text);
        let query_norm = norm(&query);

        let mut scored: Vec<ScoredDocument> = self
            .doc_vectors
            .iter()
            .zip(&self.doc_norms)
            .enumerate()
            .map(|(position, (vector, doc_norm))| ScoredDocument {
                doc_id: self.doc_ids[position].clone(),
                position,
                score: cosine_with_norms(&query, query_norm, vector, *doc_norm),
            })
            .collect();

        // sort_by is stable, so equal scores stay in corpus order
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(k);
        scored
    }

    /// Inverse document frequency of a term, if it occurs in the corpus
    pub fn idf(&self, term: &str) -> Option<f64> {
        self.idf.get(term).copied()
    }

    /// TF-IDF vector of the document at `position`
    pub fn doc_vector(&self, position: usize) -> Option<&TermVector> {
        self.doc_vectors.get(position)
    }

    /// Document ids in corpus order
    pub fn doc_ids(&self) -> &[String] {
        &self.doc_ids
    }

    pub fn vocabulary_size(&self) -> usize {
        self.idf.len()
    }

    pub fn len(&self) -> usize {
        self.doc_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doc_ids.is_empty()
    }
}
