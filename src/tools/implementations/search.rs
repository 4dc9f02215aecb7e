//! `search` tool: TF-IDF ranking over the corpus

use crate::errors::ToolError;
use crate::retrieval::RetrievalEngine;
use crate::tools::types::{ParamKind, ParamSpec, Tool, ToolArgs, ToolSpec};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

pub const SEARCH_TOOL: &str = "search";

/// Ranks documents against a free-text query
#[derive(Debug, Clone)]
pub struct SearchTool {
    engine: Arc<RetrievalEngine>,
    spec: ToolSpec,
}

impl SearchTool {
    /// The default `k` comes from the engine's search parameters
    pub fn new(engine: Arc<RetrievalEngine>) -> Self {
        let default_k = engine.default_params().top_k.to_string();
        let spec = ToolSpec::new(
            SEARCH_TOOL,
            "Search the document collection and return the most relevant documents with a short snippet of each.",
        )
        .with_param(ParamSpec::required(
            "query",
            ParamKind::String,
            "Keywords or a question to search for",
        ))
        .with_param(ParamSpec::optional(
            "k",
            ParamKind::Integer,
            "Number of documents to return",
            default_k,
        ));

        Self { engine, spec }
    }
}

#[async_trait]
impl Tool for SearchTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn execute(&self, args: &ToolArgs) -> Result<Value, ToolError> {
        let query = args.get_str("query")?;
        if query.trim().is_empty() {
            return Err(ToolError::InvalidArguments {
                tool: SEARCH_TOOL.to_string(),
                reason: "query must not be empty".to_string(),
            });
        }
        let k = args.get_usize("k")?;

        let results = self.engine.search(query, k);
        Ok(json!({
            "tool": SEARCH_TOOL,
            "query": query,
            "results": results,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::{Corpus, Document};

    fn tool() -> SearchTool {
        let corpus = Corpus::new(vec![
            Document::new("doc1", "Revenue grew on strong sales.").with_title("Annual report"),
            Document::new("doc2", "Cash flow from operations fell."),
        ]);
        SearchTool::new(Arc::new(RetrievalEngine::build(corpus).unwrap()))
    }

    #[tokio::test]
    async fn test_search_returns_ranked_results() {
        let tool = tool();
        let args = ToolArgs::new(SEARCH_TOOL).with("query", "sales").with("k", "1");
        let value = tool.execute(&args).await.unwrap();

        assert_eq!(value["tool"], "search");
        assert_eq!(value["query"], "sales");
        let results = value["results"].as_array().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0]["id"], "doc1");
        assert_eq!(results[0]["title"], "Annual report");
        assert!(results[0]["score"].as_f64().unwrap() > 0.0);
    }

    #[tokio::test]
    async fn test_blank_query_rejected() {
        let args = ToolArgs::new(SEARCH_TOOL).with("query", "  ").with("k", "3");
        assert!(matches!(
            tool().execute(&args).await,
            Err(ToolError::InvalidArguments { .. })
        ));
    }

    #[test]
    fn test_spec_default_k() {
        let tool = tool();
        assert_eq!(tool.spec().param("k").unwrap().default.as_deref(), Some("3"));
    }
}
