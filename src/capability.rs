// ABOUTME: Capability interfaces the evaluator consumes — LLM, tools, memory, file reads (§6)

use crate::error::EvalError;
use crate::result::ResultRecord;
use crate::value::Value;
use std::collections::HashMap;

/// Metadata describing a registered tool, the same shape the documentation
/// macro (`orchestrator-macros::tool`) captures from a function's doc
/// comments: signature, description, worked examples, related tools.
#[derive(Debug, Clone)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub examples: Vec<String>,
    pub related: Vec<String>,
    pub category: String,
}

impl ToolSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        ToolSpec {
            name: name.into(),
            description: description.into(),
            examples: Vec::new(),
            related: Vec::new(),
            category: "General".to_string(),
        }
    }
}

/// Tool names must match `^[A-Za-z0-9_-]{1,64}$` (§6.2).
pub fn is_valid_tool_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 64
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// `llm_call` contract (§6.1). A conversation turn: role-tagged history,
/// an optional output schema reference, and the active tool set the model
/// may invoke.
pub trait LlmCapability {
    fn llm_call(
        &self,
        prompt: &str,
        model_id: &str,
        tools: &[ToolSpec],
        output_schema: Option<&str>,
        message_history: Option<&[String]>,
    ) -> ResultRecord;
}

/// `register_tool`/`invoke`/`list_active` (§6.2).
pub trait ToolSurface {
    fn register_tool(&mut self, spec: ToolSpec, func: fn(&[Value]) -> Result<Value, EvalError>);
    fn invoke(&self, name: &str, args: &[Value]) -> Option<ResultRecord>;
    fn contains(&self, name: &str) -> bool;
    fn list_active(&self) -> Vec<ToolSpec>;
    fn describe(&self, name: &str) -> Option<ToolSpec>;
}

/// `lookup_context` contract (§6.3).
pub struct MemoryMatch {
    pub path: String,
    pub relevance: f64,
    pub excerpt: Option<String>,
}

pub struct MemoryLookup {
    pub summary: String,
    pub matches: Vec<MemoryMatch>,
}

pub trait MemoryFacade {
    fn lookup_context(&self, query_fragments: &HashMap<String, String>, max_tokens: usize) -> MemoryLookup;
}

/// `read(path) -> string | FailedResult` (§6.4).
pub trait FileReader {
    fn read(&self, path: &str) -> Result<String, EvalError>;
}
