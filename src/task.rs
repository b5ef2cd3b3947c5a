// ABOUTME: Atomic task templates — declarative definitions registered by `defatom` (§3, §4.5)

use crate::error::EvalError;
use crate::value::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
}

impl ParamType {
    pub fn name(self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Integer => "integer",
            ParamType::Number => "number",
            ParamType::Boolean => "boolean",
            ParamType::Array => "array",
            ParamType::Object => "object",
        }
    }

    pub fn parse(s: &str) -> Option<ParamType> {
        match s {
            "string" => Some(ParamType::String),
            "integer" => Some(ParamType::Integer),
            "number" => Some(ParamType::Number),
            "boolean" => Some(ParamType::Boolean),
            "array" => Some(ParamType::Array),
            "object" => Some(ParamType::Object),
            _ => None,
        }
    }

    /// Whether `value` is admissible for this declared type.
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            ParamType::String => matches!(value, Value::String(_) | Value::Symbol(_)),
            ParamType::Integer => matches!(value, Value::Number(n) if n.as_i64().is_some()),
            ParamType::Number => matches!(value, Value::Number(_)),
            ParamType::Boolean => matches!(value, Value::Bool(_)),
            ParamType::Array => matches!(value, Value::List(_) | Value::Nil),
            ParamType::Object => matches!(value, Value::Map(_)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub param_type: ParamType,
    pub required: bool,
    pub default: Option<Value>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputType {
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct OutputFormat {
    pub output_type: OutputType,
    pub schema: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AtomicTaskTemplate {
    pub name: String,
    pub subtype: Option<String>,
    pub params: Vec<Param>,
    pub instructions: String,
    pub output_format: Option<OutputFormat>,
    pub context_relevance: HashMap<String, bool>,
    pub preferred_model: Option<String>,
    pub description: Option<String>,
    /// Explicit file paths the template wants read as context on every
    /// invocation, second in the Dispatcher's context-selection precedence
    /// behind an explicit `file_context` argument (§4.9).
    pub file_paths: Option<Vec<String>>,
    /// Opts the template into automatic Memory Facade retrieval (§4.4.3,
    /// §4.9) when neither an explicit `file_context` argument nor
    /// `file_paths` produced any context.
    pub auto_context: bool,
}

impl AtomicTaskTemplate {
    /// Key used by the registry's secondary composite index (`"name:subtype"`).
    pub fn composite_key(&self) -> Option<String> {
        self.subtype
            .as_ref()
            .map(|subtype| format!("{}:{}", self.name, subtype))
    }

    fn find_param(&self, name: &str) -> Option<&Param> {
        self.params.iter().find(|p| p.name == name)
    }

    /// The subset of bound parameters flagged `context_relevance=true`
    /// (default: all parameters), stringified for a Memory Facade query
    /// (§4.4.3). Never alters the parameter values bound to the template.
    pub fn context_relevant_fragments(&self, bound: &HashMap<String, Value>) -> HashMap<String, String> {
        self.params
            .iter()
            .filter(|p| *self.context_relevance.get(&p.name).unwrap_or(&true))
            .filter_map(|p| bound.get(&p.name).map(|v| (p.name.clone(), v.as_text())))
            .collect()
    }

    /// Validates and fills in a raw argument mapping against declared
    /// parameters: required parameters must be present, defaults fill gaps,
    /// and each supplied value must match its parameter's declared type.
    pub fn bind_arguments(
        &self,
        supplied: HashMap<String, Value>,
    ) -> Result<HashMap<String, Value>, EvalError> {
        let mut bound = HashMap::new();
        for param in &self.params {
            match supplied.get(&param.name) {
                Some(value) => {
                    if !param.param_type.accepts(value) {
                        return Err(EvalError::argument_type_mismatch(
                            &param.name,
                            param.param_type.name(),
                            value.type_name(),
                        ));
                    }
                    bound.insert(param.name.clone(), value.clone());
                }
                None => {
                    if let Some(default) = &param.default {
                        bound.insert(param.name.clone(), default.clone());
                    } else if param.required {
                        return Err(EvalError::missing_parameter(&param.name));
                    }
                }
            }
        }
        Ok(bound)
    }

    /// Substitutes every `{{name}}` or `{{name.attr}}` placeholder in
    /// `instructions` with the stringified bound value. Purely textual,
    /// single-pass: no recursive expansion, no filters (§4.5).
    pub fn render(&self, bound: &HashMap<String, Value>) -> Result<String, EvalError> {
        let mut out = String::with_capacity(self.instructions.len());
        let mut rest = self.instructions.as_str();

        while let Some(start) = rest.find("{{") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let Some(end) = after.find("}}") else {
                // Unterminated placeholder: emit literally, matching the
                // "purely textual" substitution rule rather than erroring.
                out.push_str(&rest[start..]);
                rest = "";
                break;
            };
            let placeholder = after[..end].trim();
            let base_name = placeholder.split('.').next().unwrap_or(placeholder);

            if !self.params.iter().any(|p| p.name == base_name) {
                return Err(EvalError::unresolved_placeholder(placeholder));
            }

            let rendered = if placeholder.contains('.') {
                render_attribute(bound, placeholder)?
            } else {
                bound
                    .get(base_name)
                    .map(|v| v.as_text())
                    .unwrap_or_default()
            };
            out.push_str(&rendered);
            rest = &after[end + 2..];
        }
        out.push_str(rest);
        Ok(out)
    }
}

/// Resolves `name.attr` against a bound `Map` value, or falls back to the
/// base value's text form when it is not a map (best-effort, since the
/// data model does not require every param to be an object).
fn render_attribute(bound: &HashMap<String, Value>, placeholder: &str) -> Result<String, EvalError> {
    let mut parts = placeholder.split('.');
    let base_name = parts.next().unwrap_or_default();
    let attr = parts.next().unwrap_or_default();

    match bound.get(base_name) {
        Some(Value::Map(map)) => Ok(map.get(attr).map(|v| v.as_text()).unwrap_or_default()),
        Some(other) => Ok(other.as_text()),
        None => Ok(String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template() -> AtomicTaskTemplate {
        AtomicTaskTemplate {
            name: "greet".to_string(),
            subtype: None,
            params: vec![Param {
                name: "name".to_string(),
                param_type: ParamType::String,
                required: true,
                default: None,
                description: None,
            }],
            instructions: "Hello, {{name}}!".to_string(),
            output_format: None,
            context_relevance: HashMap::new(),
            preferred_model: None,
            description: None,
            file_paths: None,
            auto_context: false,
        }
    }

    #[test]
    fn context_relevant_fragments_defaults_to_all_params() {
        let t = template();
        let mut bound = HashMap::new();
        bound.insert("name".to_string(), Value::String("Ada".to_string()));
        let fragments = t.context_relevant_fragments(&bound);
        assert_eq!(fragments.get("name").map(String::as_str), Some("Ada"));
    }

    #[test]
    fn context_relevant_fragments_excludes_flagged_false() {
        let mut t = template();
        t.context_relevance.insert("name".to_string(), false);
        let mut bound = HashMap::new();
        bound.insert("name".to_string(), Value::String("Ada".to_string()));
        assert!(t.context_relevant_fragments(&bound).is_empty());
    }

    #[test]
    fn binds_required_parameter() {
        let t = template();
        let mut supplied = HashMap::new();
        supplied.insert("name".to_string(), Value::String("Ada".to_string()));
        let bound = t.bind_arguments(supplied).unwrap();
        assert_eq!(t.render(&bound).unwrap(), "Hello, Ada!");
    }

    #[test]
    fn missing_required_parameter_is_argument_error() {
        let t = template();
        let err = t.bind_arguments(HashMap::new()).unwrap_err();
        assert_eq!(err.0.reason, "missing_parameter");
    }

    #[test]
    fn unresolved_placeholder_errors() {
        let mut t = template();
        t.instructions = "Hello, {{missing}}!".to_string();
        let mut supplied = HashMap::new();
        supplied.insert("name".to_string(), Value::String("Ada".to_string()));
        let bound = t.bind_arguments(supplied).unwrap();
        let err = t.render(&bound).unwrap_err();
        assert_eq!(err.0.reason, "unresolved_placeholder");
    }

    #[test]
    fn type_mismatch_is_argument_error() {
        let t = template();
        let mut supplied = HashMap::new();
        supplied.insert("name".to_string(), Value::int(5));
        let err = t.bind_arguments(supplied).unwrap_err();
        assert_eq!(err.0.reason, "type_error");
    }

    #[test]
    fn composite_key_format() {
        let mut t = template();
        t.subtype = Some("casual".to_string());
        assert_eq!(t.composite_key(), Some("greet:casual".to_string()));
    }
}
