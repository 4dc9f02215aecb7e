//! Document corpus
//!
//! A corpus is an ordered list of documents. Order matters: it breaks ties
//! between equally relevant documents at query time. Corpora come either from
//! the built-in financial documents compiled into the binary or from a JSON
//! file holding an array of `{id, title?, text}` objects.

use crate::errors::{AgentError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Built-in corpus shipped with the binary
const BUILTIN_CORPUS: &str = include_str!("../../data/corpus.json");

/// A single immutable document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub text: String,
}

impl Document {
    /// Create a document without a title
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            text: text.into(),
        }
    }

    /// Set the title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Text that gets indexed: title followed by body
    pub fn indexable_text(&self) -> String {
        if self.title.is_empty() {
            self.text.clone()
        } else {
            format!("{} {}", self.title, self.text)
        }
    }
}

/// Ordered collection of documents
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Corpus {
    documents: Vec<Document>,
}

impl Corpus {
    pub fn new(documents: Vec<Document>) -> Self {
        Self { documents }
    }

    /// Corpus of built-in financial documents
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_CORPUS)
    }

    /// Parse a corpus from a JSON array
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| AgentError::CorpusLoad(format!("invalid corpus JSON: {}", e)))
    }

    /// Load a corpus from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AgentError::CorpusLoad(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&contents)
    }

    /// Load from `path` when given, otherwise fall back to the built-in corpus
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load_from_file(p),
            None => Self::builtin(),
        }
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn get(&self, position: usize) -> Option<&Document> {
        self.documents.get(position)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl From<Vec<Document>> for Corpus {
    fn from(documents: Vec<Document>) -> Self {
        Self::new(documents)
    }
}
