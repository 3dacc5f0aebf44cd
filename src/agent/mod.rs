// ABOUTME: Query agent module - the LLM + MCP loop behind processQuery.
// ABOUTME: Provides QueryAgent, AgentConfig and the keyword-based action planner.

mod query;

pub use query::{
    Action, ActionResult, AgentConfig, DEFAULT_RESOURCE_URI, DEFAULT_SYSTEM_PROMPT,
    DEFAULT_TOOL_NAME, QueryAgent, final_prompt, plan_actions,
};
