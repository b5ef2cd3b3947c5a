// ABOUTME: Task Registry — stores atomic templates and mediates their execution (§4.6)

use crate::capability::{FileReader, LlmCapability, MemoryFacade, ToolSpec};
use crate::config::{DEFAULT_MAX_CONTEXT_TOKENS, DEFAULT_MODEL};
use crate::error::EvalError;
use crate::result::ResultRecord;
use crate::task::{AtomicTaskTemplate, OutputType};
use crate::value::Value;
use std::collections::HashMap;

/// `name -> template` primary index plus `"type:subtype" -> name` secondary
/// composite index. Registration is append-only within a process;
/// re-registering the same name replaces the previous template.
#[derive(Default)]
pub struct TaskRegistry {
    by_name: HashMap<String, AtomicTaskTemplate>,
    by_composite: HashMap<String, String>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        TaskRegistry::default()
    }

    pub fn register(&mut self, template: AtomicTaskTemplate) {
        if let Some(key) = template.composite_key() {
            self.by_composite.insert(key, template.name.clone());
        }
        self.by_name.insert(template.name.clone(), template);
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.find(identifier).is_some()
    }

    /// Lookup by identifier tries direct name first, then the composite index.
    pub fn find(&self, identifier: &str) -> Option<&AtomicTaskTemplate> {
        if let Some(template) = self.by_name.get(identifier) {
            return Some(template);
        }
        self.by_composite
            .get(identifier)
            .and_then(|name| self.by_name.get(name))
    }

    /// Validates `params` against the template's declared parameters, then
    /// delegates to the Atomic-Task Executor (§4.5). Context selection
    /// follows the Dispatcher's precedence (§4.9): an explicit
    /// `file_context` argument, then the template's declared `file_paths`,
    /// then automatic Memory Facade retrieval limited to the
    /// context-relevant parameter subset (§4.4.3), only when the template
    /// opts in.
    pub fn execute(
        &self,
        identifier: &str,
        mut params: HashMap<String, Value>,
        llm: &dyn LlmCapability,
        active_tools: &[ToolSpec],
        memory: &dyn MemoryFacade,
        files: &dyn FileReader,
    ) -> Result<ResultRecord, EvalError> {
        let template = self
            .find(identifier)
            .ok_or_else(|| EvalError::template_not_found(identifier))?;

        let explicit_file_context = params.remove("file_context");
        let bound = template.bind_arguments(params)?;
        let body = template.render(&bound)?;
        let context = self.resolve_context(template, &bound, explicit_file_context, memory, files);
        let prompt = match context {
            Some(ctx) if !ctx.is_empty() => format!("Context:\n{}\n\n{}", ctx, body),
            _ => body,
        };
        let model = template.preferred_model.as_deref().unwrap_or(DEFAULT_MODEL);
        let schema = template
            .output_format
            .as_ref()
            .and_then(|f| f.schema.as_deref());

        let result = llm.llm_call(&prompt, model, active_tools, schema, None);
        if !result.is_ok() {
            return Ok(result);
        }

        let wants_json = template
            .output_format
            .as_ref()
            .map(|f| f.output_type == OutputType::Json)
            .unwrap_or(false);

        if wants_json {
            let raw = result.content.as_text();
            match serde_json::from_str::<serde_json::Value>(&raw) {
                Ok(parsed) => {
                    let mut result = result;
                    result
                        .notes
                        .insert("parsed_content".to_string(), Value::String(parsed.to_string()));
                    Ok(result)
                }
                Err(_) => Err(EvalError::task_failure(
                    "invalid_output",
                    "structured output did not parse as JSON",
                )),
            }
        } else {
            Ok(result)
        }
    }

    /// Resolves the context text for one invocation, in descending
    /// precedence (§4.9): explicit argument, declared `file_paths`, then
    /// automatic retrieval. A read failure on a declared path is skipped
    /// rather than failing the whole invocation.
    fn resolve_context(
        &self,
        template: &AtomicTaskTemplate,
        bound: &HashMap<String, Value>,
        explicit_file_context: Option<Value>,
        memory: &dyn MemoryFacade,
        files: &dyn FileReader,
    ) -> Option<String> {
        if let Some(value) = explicit_file_context {
            return Some(value.as_text());
        }

        if let Some(paths) = &template.file_paths {
            let mut combined = String::new();
            for path in paths {
                if let Ok(text) = files.read(path) {
                    if !combined.is_empty() {
                        combined.push_str("\n\n");
                    }
                    combined.push_str(&text);
                }
            }
            if !combined.is_empty() {
                return Some(combined);
            }
        }

        if template.auto_context {
            let fragments = template.context_relevant_fragments(bound);
            let lookup = memory.lookup_context(&fragments, DEFAULT_MAX_CONTEXT_TOKENS);
            if !lookup.summary.is_empty() {
                return Some(lookup.summary);
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::NullMemory;
    use crate::result::ResultRecord;
    use crate::sandbox::NullFileReader;
    use crate::task::{Param, ParamType};

    struct StubLlm {
        reply: String,
    }

    impl LlmCapability for StubLlm {
        fn llm_call(
            &self,
            _prompt: &str,
            _model_id: &str,
            _tools: &[ToolSpec],
            _output_schema: Option<&str>,
            _message_history: Option<&[String]>,
        ) -> ResultRecord {
            ResultRecord::complete(Value::String(self.reply.clone()))
        }
    }

    /// Captures the last prompt it was handed, so tests can assert on how
    /// context was woven into it without parsing `ResultRecord` content.
    struct CapturingLlm {
        seen_prompt: std::cell::RefCell<String>,
    }

    impl LlmCapability for CapturingLlm {
        fn llm_call(
            &self,
            prompt: &str,
            _model_id: &str,
            _tools: &[ToolSpec],
            _output_schema: Option<&str>,
            _message_history: Option<&[String]>,
        ) -> ResultRecord {
            *self.seen_prompt.borrow_mut() = prompt.to_string();
            ResultRecord::complete(Value::Nil)
        }
    }

    struct StubFileReader {
        contents: HashMap<String, String>,
    }

    impl FileReader for StubFileReader {
        fn read(&self, path: &str) -> Result<String, EvalError> {
            self.contents
                .get(path)
                .cloned()
                .ok_or_else(|| EvalError::tool_failure("read-file", format!("no such path: {}", path)))
        }
    }

    struct StubMemory {
        summary: String,
    }

    impl MemoryFacade for StubMemory {
        fn lookup_context(
            &self,
            _query_fragments: &HashMap<String, String>,
            _max_tokens: usize,
        ) -> crate::capability::MemoryLookup {
            crate::capability::MemoryLookup {
                summary: self.summary.clone(),
                matches: Vec::new(),
            }
        }
    }

    fn greet_template() -> AtomicTaskTemplate {
        AtomicTaskTemplate {
            name: "greet".to_string(),
            subtype: Some("casual".to_string()),
            params: vec![Param {
                name: "name".to_string(),
                param_type: ParamType::String,
                required: true,
                default: None,
                description: None,
            }],
            instructions: "Hello, {{name}}!".to_string(),
            output_format: None,
            context_relevance: Default::default(),
            preferred_model: None,
            description: None,
            file_paths: None,
            auto_context: false,
        }
    }

    #[test]
    fn register_then_execute_by_name() {
        let mut registry = TaskRegistry::new();
        registry.register(greet_template());
        let llm = StubLlm {
            reply: "Hello, Ada!".to_string(),
        };
        let mut params = HashMap::new();
        params.insert("name".to_string(), Value::String("Ada".to_string()));
        let result = registry
            .execute("greet", params, &llm, &[], &NullMemory, &NullFileReader)
            .unwrap();
        assert!(result.is_ok());
        assert_eq!(result.content.as_text(), "Hello, Ada!");
    }

    #[test]
    fn composite_index_resolves() {
        let mut registry = TaskRegistry::new();
        registry.register(greet_template());
        assert!(registry.contains("greet:casual"));
    }

    #[test]
    fn reregistration_replaces_previous_template() {
        let mut registry = TaskRegistry::new();
        registry.register(greet_template());
        let mut updated = greet_template();
        updated.instructions = "Hi, {{name}}.".to_string();
        registry.register(updated);
        assert_eq!(
            registry.find("greet").unwrap().instructions,
            "Hi, {{name}}."
        );
    }

    #[test]
    fn unknown_identifier_is_template_not_found() {
        let registry = TaskRegistry::new();
        let llm = StubLlm {
            reply: String::new(),
        };
        let err = registry
            .execute("nope", HashMap::new(), &llm, &[], &NullMemory, &NullFileReader)
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::TemplateNotFound);
    }

    #[test]
    fn explicit_file_context_argument_wins_over_declared_file_paths() {
        let mut registry = TaskRegistry::new();
        let mut template = greet_template();
        template.file_paths = Some(vec!["notes.txt".to_string()]);
        registry.register(template);

        let llm = CapturingLlm {
            seen_prompt: std::cell::RefCell::new(String::new()),
        };
        let files = StubFileReader {
            contents: [("notes.txt".to_string(), "from disk".to_string())].into(),
        };
        let mut params = HashMap::new();
        params.insert("name".to_string(), Value::String("Ada".to_string()));
        params.insert("file_context".to_string(), Value::String("from argument".to_string()));

        registry
            .execute("greet", params, &llm, &[], &NullMemory, &files)
            .unwrap();
        assert!(llm.seen_prompt.borrow().contains("from argument"));
        assert!(!llm.seen_prompt.borrow().contains("from disk"));
    }

    #[test]
    fn declared_file_paths_are_read_when_no_explicit_context_is_given() {
        let mut registry = TaskRegistry::new();
        let mut template = greet_template();
        template.file_paths = Some(vec!["notes.txt".to_string()]);
        registry.register(template);

        let llm = CapturingLlm {
            seen_prompt: std::cell::RefCell::new(String::new()),
        };
        let files = StubFileReader {
            contents: [("notes.txt".to_string(), "from disk".to_string())].into(),
        };
        let mut params = HashMap::new();
        params.insert("name".to_string(), Value::String("Ada".to_string()));

        registry
            .execute("greet", params, &llm, &[], &NullMemory, &files)
            .unwrap();
        assert!(llm.seen_prompt.borrow().contains("from disk"));
    }

    #[test]
    fn auto_context_falls_back_to_memory_facade_when_nothing_else_resolved() {
        let mut registry = TaskRegistry::new();
        let mut template = greet_template();
        template.auto_context = true;
        registry.register(template);

        let llm = CapturingLlm {
            seen_prompt: std::cell::RefCell::new(String::new()),
        };
        let memory = StubMemory {
            summary: "from memory".to_string(),
        };
        let mut params = HashMap::new();
        params.insert("name".to_string(), Value::String("Ada".to_string()));

        registry
            .execute("greet", params, &llm, &[], &memory, &NullFileReader)
            .unwrap();
        assert!(llm.seen_prompt.borrow().contains("from memory"));
    }

    #[test]
    fn no_context_source_leaves_prompt_unprefixed() {
        let mut registry = TaskRegistry::new();
        registry.register(greet_template());

        let llm = CapturingLlm {
            seen_prompt: std::cell::RefCell::new(String::new()),
        };
        let mut params = HashMap::new();
        params.insert("name".to_string(), Value::String("Ada".to_string()));

        registry
            .execute("greet", params, &llm, &[], &NullMemory, &NullFileReader)
            .unwrap();
        assert_eq!(*llm.seen_prompt.borrow(), "Hello, Ada!");
    }
}
