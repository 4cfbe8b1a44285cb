pub mod claim_agent;
pub mod prompt;
pub mod tool_loop;

pub use claim_agent::{ClaimAgent, ClaimRun};
pub use prompt::{FINAL_ANSWER_MARKER, accident_message, claim_handler_system_prompt};
pub use tool_loop::{STEP_BUDGET, ToolCallRecord, ToolLoop, ToolLoopResult, ToolLoopRunParams};
