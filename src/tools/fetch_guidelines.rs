use super::traits::{ExecutionContext, Tool, ToolResult};
use crate::retrieval::GuidelineRetriever;
use async_trait::async_trait;
use serde_json::json;

/// Semantic search over stored policies; always answers with a policy,
/// falling back to generic auto coverage.
pub struct FetchGuidelinesTool {
    retriever: GuidelineRetriever,
}

impl FetchGuidelinesTool {
    pub fn new(retriever: GuidelineRetriever) -> Self {
        Self { retriever }
    }
}

#[async_trait]
impl Tool for FetchGuidelinesTool {
    fn name(&self) -> &str {
        "fetch_guidelines"
    }

    fn description(&self) -> &str {
        "Runs semantic search on existing policies to find relevant ones based on the image description."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Description of the accident to match against policies"
                },
                "n": {
                    "type": "integer",
                    "description": "Number of nearest policies to consider (default 1)",
                    "minimum": 1
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(
        &self,
        args: serde_json::Value,
        _ctx: &ExecutionContext,
    ) -> anyhow::Result<ToolResult> {
        let query = args
            .get("query")
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .ok_or_else(|| anyhow::anyhow!("Missing 'query' parameter"))?;

        let n = args
            .get("n")
            .and_then(serde_json::Value::as_u64)
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(1);

        let record = self.retriever.fetch(query, n).await;
        Ok(ToolResult::ok(serde_json::to_string(&record)?))
    }
}
