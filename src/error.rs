// ABOUTME: Error taxonomy for evaluation failures — tagged kinds with structured details

use crate::value::Value;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// The ten error kinds named by the error taxonomy. Every failure the
/// evaluator, registry, executor, or dispatcher can produce is tagged with
/// exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ParseError,
    UndefinedSymbol,
    ArgumentError,
    TypeError,
    TaskFailure,
    ToolFailure,
    TemplateNotFound,
    IterationLimit,
    Timeout,
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::ParseError => "ParseError",
            ErrorKind::UndefinedSymbol => "UndefinedSymbol",
            ErrorKind::ArgumentError => "ArgumentError",
            ErrorKind::TypeError => "TypeError",
            ErrorKind::TaskFailure => "TaskFailure",
            ErrorKind::ToolFailure => "ToolFailure",
            ErrorKind::TemplateNotFound => "TemplateNotFound",
            ErrorKind::IterationLimit => "IterationLimit",
            ErrorKind::Timeout => "Timeout",
            ErrorKind::Internal => "Internal",
        };
        write!(f, "{}", s)
    }
}

/// The structured error object carried by a FAILED `Result` (§3).
#[derive(Debug, Clone)]
pub struct ErrorObject {
    pub kind: ErrorKind,
    /// Short machine-stable slug, e.g. `missing_parameter`.
    pub reason: String,
    pub details: HashMap<String, String>,
    pub message: String,
    pub expression: Option<String>,
}

impl ErrorObject {
    pub fn new(kind: ErrorKind, reason: impl Into<String>, message: impl Into<String>) -> Self {
        ErrorObject {
            kind,
            reason: reason.into(),
            details: HashMap::new(),
            message: message.into(),
            expression: None,
        }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    pub fn with_expression(mut self, expr: impl Into<String>) -> Self {
        self.expression = Some(expr.into());
        self
    }
}

impl fmt::Display for ErrorObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.kind, self.reason, self.message)
    }
}

/// Internal propagation type. Every special form, builtin, and capability
/// call returns `Result<Value, EvalError>`; the Dispatcher is the single
/// place this is caught and folded into a FAILED `ResultRecord` (§7).
#[derive(Error, Debug, Clone)]
#[error("{0}")]
pub struct EvalError(pub ErrorObject);

impl EvalError {
    pub fn kind(&self) -> ErrorKind {
        self.0.kind
    }

    pub fn parse_error(message: impl Into<String>, line: usize, column: usize) -> Self {
        EvalError(
            ErrorObject::new(ErrorKind::ParseError, "syntax_error", message)
                .with_detail("line", line.to_string())
                .with_detail("column", column.to_string()),
        )
    }

    pub fn undefined_symbol(name: &str, expression: impl Into<String>) -> Self {
        EvalError(
            ErrorObject::new(
                ErrorKind::UndefinedSymbol,
                "undefined_symbol",
                format!("undefined symbol: {}", name),
            )
            .with_detail("symbol", name.to_string())
            .with_expression(expression),
        )
    }

    pub fn arity_mismatch(function: &str, expected: usize, actual: usize) -> Self {
        EvalError(
            ErrorObject::new(
                ErrorKind::ArgumentError,
                "arity_mismatch",
                format!(
                    "{}: expected {} argument(s), got {}",
                    function, expected, actual
                ),
            )
            .with_detail("expected", expected.to_string())
            .with_detail("actual", actual.to_string()),
        )
    }

    pub fn missing_parameter(name: &str) -> Self {
        EvalError(
            ErrorObject::new(
                ErrorKind::ArgumentError,
                "missing_parameter",
                format!("missing required parameter: {}", name),
            )
            .with_detail("parameter", name.to_string()),
        )
    }

    pub fn unresolved_placeholder(name: &str) -> Self {
        EvalError(
            ErrorObject::new(
                ErrorKind::ArgumentError,
                "unresolved_placeholder",
                format!("placeholder references undeclared parameter: {}", name),
            )
            .with_detail("placeholder", name.to_string()),
        )
    }

    pub fn argument_type_mismatch(parameter: &str, expected: &str, actual: &str) -> Self {
        EvalError(
            ErrorObject::new(
                ErrorKind::ArgumentError,
                "type_error",
                format!(
                    "parameter {}: expected {}, got {}",
                    parameter, expected, actual
                ),
            )
            .with_detail("parameter", parameter.to_string())
            .with_detail("expected", expected.to_string())
            .with_detail("actual", actual.to_string()),
        )
    }

    pub fn type_error(function: &str, expected: &str, actual: &Value) -> Self {
        EvalError(ErrorObject::new(
            ErrorKind::TypeError,
            "type_mismatch",
            format!(
                "{}: expected {}, got {}",
                function,
                expected,
                actual.type_name()
            ),
        ))
    }

    pub fn not_callable(actual: &Value) -> Self {
        EvalError(ErrorObject::new(
            ErrorKind::TypeError,
            "not_callable",
            format!("value of type {} is not callable", actual.type_name()),
        ))
    }

    pub fn task_failure(reason: impl Into<String>, message: impl Into<String>) -> Self {
        EvalError(ErrorObject::new(ErrorKind::TaskFailure, reason, message))
    }

    pub fn tool_failure(tool: &str, message: impl Into<String>) -> Self {
        EvalError(
            ErrorObject::new(ErrorKind::ToolFailure, "tool_error", message)
                .with_detail("tool", tool.to_string()),
        )
    }

    pub fn template_not_found(identifier: &str) -> Self {
        EvalError(
            ErrorObject::new(
                ErrorKind::TemplateNotFound,
                "template_not_found",
                format!("no task, tool, or template registered for: {}", identifier),
            )
            .with_detail("identifier", identifier.to_string()),
        )
    }

    pub fn iteration_limit(max_iterations: u64) -> Self {
        EvalError(
            ErrorObject::new(
                ErrorKind::IterationLimit,
                "iteration_limit",
                format!("loop exceeded max-iterations={}", max_iterations),
            )
            .with_detail("max_iterations", max_iterations.to_string()),
        )
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        EvalError(ErrorObject::new(ErrorKind::Timeout, "timeout", message))
    }

    pub fn internal(message: impl Into<String>) -> Self {
        EvalError(ErrorObject::new(ErrorKind::Internal, "internal_error", message))
    }

    pub fn malformed_controller_decision(expression: impl Into<String>) -> Self {
        EvalError(
            ErrorObject::new(
                ErrorKind::TaskFailure,
                "malformed_controller_decision",
                "controller must return (stop value) or (continue value)",
            )
            .with_expression(expression),
        )
    }
}
