// ABOUTME: QueryAgent - answers a user query with the LLM, runs the MCP
// ABOUTME: actions the first answer asks for, then asks for a final answer.

use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::error::{LlmError, McpError};
use crate::llm::{ChatMessage, LlmClient, LlmResponse, Usage};
use crate::mcp::{McpResponse, McpUpstream};

/// Resource the agent reads when the answer mentions files or content.
pub const DEFAULT_RESOURCE_URI: &str = "file:///hello.txt";

/// Tool the agent runs when the answer mentions the tool.
pub const DEFAULT_TOOL_NAME: &str = "tool-pelusear";

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an assistant that can read resources and run tools \
through an MCP server.

When the user asks for something, decide whether you need to:
1. Read a resource (a file, an API, etc.)
2. Run a tool
3. Both

Answer naturally and explain what you are going to do before doing it.";

// Constant patterns; construction cannot fail.
static READ_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)leer|archivo|contenido|read|file|content").expect("valid read pattern")
});

static TOOL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)pelusear|herramienta|ejecutar|tool|execute|run").expect("valid tool pattern")
});

/// Settings for the query loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentConfig {
    pub system_prompt: String,
    pub resource_uri: String,
    pub tool_name: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            resource_uri: DEFAULT_RESOURCE_URI.to_string(),
            tool_name: DEFAULT_TOOL_NAME.to_string(),
        }
    }
}

impl AgentConfig {
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_resource_uri(mut self, uri: impl Into<String>) -> Self {
        self.resource_uri = uri.into();
        self
    }

    pub fn with_tool_name(mut self, name: impl Into<String>) -> Self {
        self.tool_name = name.into();
        self
    }
}

/// An MCP action inferred from the LLM's first answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ReadResource,
    CallTool,
}

/// Outcome of one action, as reported back to the LLM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResult {
    pub action: String,
    pub result: String,
}

/// Pick the actions an answer asks for. Neither keyword set matching means
/// both actions are tried.
pub fn plan_actions(answer: &str) -> Vec<Action> {
    let mut actions = Vec::new();

    if READ_PATTERN.is_match(answer) {
        actions.push(Action::ReadResource);
    }
    if TOOL_PATTERN.is_match(answer) {
        actions.push(Action::CallTool);
    }

    if actions.is_empty() {
        actions = vec![Action::ReadResource, Action::CallTool];
    }
    actions
}

/// Prompt for the second LLM call.
pub fn final_prompt(query: &str, first_answer: &str, results: &[ActionResult]) -> String {
    let lines: Vec<String> = results
        .iter()
        .map(|r| format!("- {}: {}", r.action, r.result))
        .collect();

    format!(
        "The user asked: \"{}\"\n\nYour initial answer was: \"{}\"\n\n\
I ran the following actions:\n{}\n\n\
Now write a final answer for the user based on these results.",
        query,
        first_answer,
        lines.join("\n")
    )
}

/// Drives the LLM + MCP query loop for `processQuery`.
pub struct QueryAgent {
    llm: Arc<dyn LlmClient>,
    config: AgentConfig,
}

impl QueryAgent {
    pub fn new(llm: Arc<dyn LlmClient>, config: AgentConfig) -> Self {
        Self { llm, config }
    }

    pub fn model(&self) -> &str {
        self.llm.model()
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// One chat call with the system prompt followed by `prompt`.
    pub async fn ask(&self, prompt: &str) -> Result<LlmResponse, LlmError> {
        let messages = [
            ChatMessage::system(self.config.system_prompt.as_str()),
            ChatMessage::user(prompt),
        ];
        self.llm.complete(&messages).await
    }

    /// Answer `query`.
    ///
    /// With an upstream the full loop runs: first answer, inferred actions,
    /// final answer. Without one the first answer is returned as is. Action
    /// failures are reported to the LLM as `Error: ...` lines; only LLM
    /// failures abort.
    pub async fn process(
        &self,
        query: &str,
        upstream: Option<&dyn McpUpstream>,
    ) -> Result<LlmResponse, LlmError> {
        let first = self.ask(query).await?;

        let Some(upstream) = upstream else {
            return Ok(first);
        };

        let actions = plan_actions(&first.content);
        tracing::debug!(?actions, model = %self.model(), "executing planned MCP actions");

        let mut results = Vec::with_capacity(actions.len());
        for action in actions {
            results.push(self.execute(action, upstream).await);
        }

        let prompt = final_prompt(query, &first.content, &results);
        let mut last = self.ask(&prompt).await?;
        last.usage = sum_usage(first.usage, last.usage);
        Ok(last)
    }

    async fn execute(&self, action: Action, upstream: &dyn McpUpstream) -> ActionResult {
        let (label, outcome) = match action {
            Action::ReadResource => (
                format!("Read resource {}", self.config.resource_uri),
                upstream
                    .read_resource(&self.config.resource_uri)
                    .await
                    .map(|payload| McpResponse::from_resource_payload(&payload)),
            ),
            Action::CallTool => (
                format!("Run tool {}", self.config.tool_name),
                upstream
                    .call_tool(&self.config.tool_name, None)
                    .await
                    .map(|payload| McpResponse::from_tool_payload(&payload)),
            ),
        };

        ActionResult {
            action: label,
            result: describe(outcome),
        }
    }
}

fn describe(outcome: Result<McpResponse, McpError>) -> String {
    match outcome {
        Ok(resp) => match resp.error {
            Some(error) => format!("Error: {}", error),
            None => resp.content,
        },
        Err(e) => {
            tracing::warn!(error = %e, "MCP action failed");
            format!("Error: {}", e)
        }
    }
}

fn sum_usage(a: Option<Usage>, b: Option<Usage>) -> Option<Usage> {
    match (a, b) {
        (None, None) => None,
        (a, b) => {
            let a = a.unwrap_or_default();
            let b = b.unwrap_or_default();
            Some(Usage {
                prompt_tokens: a.prompt_tokens + b.prompt_tokens,
                completion_tokens: a.completion_tokens + b.completion_tokens,
            })
        }
    }
}
