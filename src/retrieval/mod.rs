//! Statistical retrieval over a fixed corpus
//!
//! - Tokenizer: lowercase, split on non-alphanumeric boundaries
//! - Index: smoothed TF-IDF vectors, built once
//! - Engine: cosine-ranked top-k search with snippets

pub mod tokenizer;
pub mod index;
pub mod engine;

pub use tokenizer::tokenize;
pub use index::{cosine, smoothed_idf, DocumentIndex, ScoredDocument, TermVector};
pub use engine::{DocumentSummary, RetrievalEngine, SearchHit, SearchParams};
