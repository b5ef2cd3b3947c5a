// ABOUTME: Dispatcher — single entry point routing identifiers to evaluation, tasks, or tools (§4.9)

use crate::builtins::register_builtins;
use crate::env::Environment;
use crate::error::EvalError;
use crate::eval::Interpreter;
use crate::parser::parse;
use crate::result::ResultRecord;
use crate::value::Value;
use std::collections::HashMap;
use std::rc::Rc;

/// Routes `(identifier, params, flags)` to one of three places: S-expression
/// evaluation, the Task Registry, or the Tool Surface (§4.9). This is the
/// single place every raised `EvalError` is caught and normalized into a
/// FAILED Result — nothing past this boundary ever surfaces a bare error
/// (§7).
pub struct Dispatcher {
    pub interpreter: Interpreter,
}

impl Dispatcher {
    pub fn new(interpreter: Interpreter) -> Self {
        Dispatcher { interpreter }
    }

    /// `use_history` mirrors the command-line `--use-history` flag (§6.5);
    /// the core keeps no conversation state of its own, so it is threaded
    /// through only as far as a future caller-seeded environment would need
    /// it. Templates remain free to request `message_history` from the LLM
    /// Capability on their own terms.
    pub fn dispatch(&self, identifier: &str, params: HashMap<String, Value>, _use_history: bool) -> ResultRecord {
        let env = Environment::new();
        register_builtins(&env);
        let trimmed = identifier.trim();

        let outcome = if trimmed.starts_with('(') {
            self.dispatch_expression(trimmed, &env)
        } else if self.interpreter.registry.borrow().contains(trimmed) {
            self.dispatch_task(trimmed, params)
        } else if self.interpreter.tools.contains(trimmed) {
            self.dispatch_tool(trimmed, params)
        } else {
            Err(EvalError::template_not_found(trimmed))
        };

        Self::normalize(outcome)
    }

    fn dispatch_expression(&self, source: &str, env: &Rc<Environment>) -> Result<Value, EvalError> {
        let ast = parse(source)?;
        self.interpreter.eval(&ast, env)
    }

    fn dispatch_task(&self, identifier: &str, params: HashMap<String, Value>) -> Result<Value, EvalError> {
        let active_tools = self.interpreter.tools.list_active();
        let result = self.interpreter.registry.borrow().execute(
            identifier,
            params,
            self.interpreter.llm.as_ref(),
            &active_tools,
            self.interpreter.memory.as_ref(),
            self.interpreter.files.as_ref(),
        )?;
        Ok(Value::Result(Box::new(result)))
    }

    fn dispatch_tool(&self, identifier: &str, params: HashMap<String, Value>) -> Result<Value, EvalError> {
        let args = ordered_positional(params);
        match self.interpreter.tools.invoke(identifier, &args) {
            Some(result) => Ok(Value::Result(Box::new(result))),
            None => Err(EvalError::tool_failure(identifier, "tool invocation produced no result")),
        }
    }

    fn normalize(outcome: Result<Value, EvalError>) -> ResultRecord {
        match outcome {
            Ok(Value::Result(record)) => *record,
            Ok(other) => ResultRecord::complete(other),
            Err(err) => ResultRecord::failed(err.0),
        }
    }
}

/// Direct tool invocation has no declared parameter order to bind against
/// (unlike a task template, whose params are named in its `defatom`), so
/// `key=value` pairs from the command line are passed through positionally
/// in key-sorted order — deterministic, if not semantically aware of what
/// the tool expects.
fn ordered_positional(params: HashMap<String, Value>) -> Vec<Value> {
    let mut pairs: Vec<(String, Value)> = params.into_iter().collect();
    pairs.sort_by(|a, b| a.0.cmp(&b.0));
    pairs.into_iter().map(|(_, v)| v).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NetConfig;
    use crate::llm::NullLlm;
    use crate::memory::NullMemory;
    use crate::sandbox::NullFileReader;
    use crate::task::{AtomicTaskTemplate, Param, ParamType};
    use crate::tools::InMemoryToolSurface;
    use std::collections::HashMap;

    fn dispatcher() -> Dispatcher {
        let net = NetConfig { enabled: true, allowed_addresses: vec![] };
        Dispatcher::new(Interpreter::new(
            Box::new(InMemoryToolSurface::new().with_network_tools(net)),
            Box::new(NullLlm),
            Box::new(NullMemory),
            Box::new(NullFileReader),
        ))
    }

    #[test]
    fn expression_route_evaluates_and_wraps() {
        let d = dispatcher();
        let result = d.dispatch("(quote 42)", HashMap::new(), false);
        assert!(result.is_ok());
    }

    #[test]
    fn unknown_identifier_is_template_not_found() {
        let d = dispatcher();
        let result = d.dispatch("totally-unknown", HashMap::new(), false);
        assert!(!result.is_ok());
        assert_eq!(result.error.unwrap().kind, crate::error::ErrorKind::TemplateNotFound);
    }

    #[test]
    fn task_registry_takes_precedence_over_tool_surface() {
        let d = dispatcher();
        d.interpreter.registry.borrow_mut().register(AtomicTaskTemplate {
            name: "http-get".to_string(),
            subtype: None,
            params: vec![Param {
                name: "url".to_string(),
                param_type: ParamType::String,
                required: true,
                default: None,
                description: None,
            }],
            instructions: "Fetch {{url}}".to_string(),
            output_format: None,
            context_relevance: Default::default(),
            preferred_model: None,
            description: None,
            file_paths: None,
            auto_context: false,
        });
        let mut params = HashMap::new();
        params.insert("url".to_string(), Value::String("http://example.test".to_string()));
        let result = d.dispatch("http-get", params, false);
        // Routed through the Task Registry (NullLlm echoes Nil content), not
        // through the http-get tool, which would have attempted a real request.
        assert!(result.is_ok());
    }

    #[test]
    fn tool_surface_invoked_when_no_template_matches() {
        let d = dispatcher();
        let result = d.dispatch("http-get", HashMap::new(), false);
        // No URL argument supplied: the tool itself reports a FAILED Result.
        assert!(!result.is_ok());
    }
}
