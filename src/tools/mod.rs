pub mod clean_chat_history;
pub mod fetch_guidelines;
pub mod persist_data;
pub mod registry;
pub mod traits;

pub use clean_chat_history::CleanChatHistoryTool;
pub use fetch_guidelines::FetchGuidelinesTool;
pub use persist_data::{PERSIST_DATA_TOOL, PersistDataTool};
pub use registry::ToolRegistry;
pub use traits::{ExecutionContext, Tool, ToolResult, ToolSpec};

use crate::retrieval::GuidelineRetriever;
use crate::store::{ChatHistory, DocumentStore, Namespace};
use std::sync::Arc;

/// Registry holding the claim handler's three tools.
pub fn claim_tools(
    retriever: GuidelineRetriever,
    store: Arc<dyn DocumentStore>,
    recommendations: Namespace,
    history: ChatHistory,
) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(FetchGuidelinesTool::new(retriever)));
    registry.register(Arc::new(PersistDataTool::new(store, recommendations)));
    registry.register(Arc::new(CleanChatHistoryTool::new(history)));
    registry
}
