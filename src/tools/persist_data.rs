use super::traits::{ExecutionContext, Tool, ToolResult};
use crate::store::{DocumentStore, Namespace};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;

pub const PERSIST_DATA_TOOL: &str = "persist_data";

/// Inserts the generator's recommendation document verbatim.
pub struct PersistDataTool {
    store: Arc<dyn DocumentStore>,
    namespace: Namespace,
}

impl PersistDataTool {
    pub fn new(store: Arc<dyn DocumentStore>, namespace: Namespace) -> Self {
        Self { store, namespace }
    }
}

/// `data` may arrive as an object or as JSON text holding one.
fn document_from_args(args: &Value) -> Option<Value> {
    match args.get("data")? {
        Value::Object(_) => args.get("data").cloned(),
        Value::String(text) => serde_json::from_str::<Value>(text)
            .ok()
            .filter(Value::is_object),
        _ => None,
    }
}

#[async_trait]
impl Tool for PersistDataTool {
    fn name(&self) -> &str {
        PERSIST_DATA_TOOL
    }

    fn description(&self) -> &str {
        "Persist the final claim recommendation document. Returns the id of the stored record."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "data": {
                    "type": "object",
                    "description": "Recommendation document: date, description, recommendation, \
                                    approval_level, estimated_reserves, priority, timeline, claim_handler"
                }
            },
            "required": ["data"]
        })
    }

    async fn execute(&self, args: Value, ctx: &ExecutionContext) -> anyhow::Result<ToolResult> {
        let Some(document) = document_from_args(&args) else {
            return Ok(ToolResult::failed("'data' must be a JSON object"));
        };

        match self.store.insert(&self.namespace, document).await {
            Ok(id) => {
                tracing::info!(run_id = %ctx.run_id, object_id = %id, "recommendation persisted");
                Ok(ToolResult::ok(
                    json!({
                        "message": "Data persisted successfully",
                        "object_id": id.as_str(),
                    })
                    .to_string(),
                ))
            }
            Err(e) => Ok(ToolResult::failed(format!("Failed to persist data: {e}"))),
        }
    }
}
