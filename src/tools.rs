// ABOUTME: Default Tool Surface implementation plus the built-in network tools (§6.2, §A.4)

use crate::capability::{is_valid_tool_name, ToolSpec, ToolSurface};
use crate::config::NetConfig;
use crate::error::{ErrorKind, ErrorObject, EvalError};
use crate::result::ResultRecord;
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::time::Duration;

type ToolFn = fn(&[Value]) -> Result<Value, EvalError>;

/// Network policy consulted by `http_get`/`http_post`, set once by
/// `with_network_tools`. Plain `fn` tool bodies carry no state of their own
/// (mirroring the teacher's thread-local `SANDBOX` in `builtins/mod.rs`),
/// so the allowlist lives here instead of on `InMemoryToolSurface`.
thread_local! {
    static NET_CONFIG: RefCell<Option<NetConfig>> = const { RefCell::new(None) };
}

/// Same 30s timeout the teacher's `Sandbox::http_request` defaults to.
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// An in-process tool registry: `name -> (spec, function)`. Tool names are
/// validated against `is_valid_tool_name` at registration time (§6.2).
#[derive(Default)]
pub struct InMemoryToolSurface {
    tools: HashMap<String, (ToolSpec, ToolFn)>,
}

impl InMemoryToolSurface {
    pub fn new() -> Self {
        InMemoryToolSurface::default()
    }

    /// Registers the built-in `http-get`/`http-post` tools backed by `ureq`,
    /// enforcing `net`'s allowlist the way the teacher's `Sandbox::
    /// is_address_allowed` gates `http_request` (§A.4). Specs are
    /// doc-comment-derived by `#[tool]` (§A.1).
    pub fn with_network_tools(mut self, net: NetConfig) -> Self {
        NET_CONFIG.with(|cell| *cell.borrow_mut() = Some(net));
        register_http_get(&mut self);
        register_http_post(&mut self);
        self
    }
}

/// Checked at the top of every network tool call (§6.2, §A.4): network
/// access must be enabled and the target address must pass the allowlist,
/// the same gate the teacher's `Sandbox::http_request` applies before
/// issuing a request.
fn check_address_allowed(tool: &str, url: &str) -> Result<(), EvalError> {
    NET_CONFIG.with(|cell| {
        let net = cell.borrow();
        match net.as_ref() {
            Some(net) if net.is_address_allowed(url) => Ok(()),
            Some(_) => Err(EvalError::tool_failure(tool, format!("address not allowed: {}", url))),
            None => Err(EvalError::tool_failure(tool, "network access not enabled")),
        }
    })
}

impl ToolSurface for InMemoryToolSurface {
    fn register_tool(&mut self, spec: ToolSpec, func: ToolFn) {
        if !is_valid_tool_name(&spec.name) {
            return;
        }
        self.tools.insert(spec.name.clone(), (spec, func));
    }

    fn invoke(&self, name: &str, args: &[Value]) -> Option<ResultRecord> {
        let (_, func) = self.tools.get(name)?;
        Some(match func(args) {
            Ok(value) => ResultRecord::complete(value),
            Err(err) => ResultRecord::failed(err.0),
        })
    }

    fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    fn list_active(&self) -> Vec<ToolSpec> {
        self.tools.values().map(|(spec, _)| spec.clone()).collect()
    }

    fn describe(&self, name: &str) -> Option<ToolSpec> {
        self.tools.get(name).map(|(spec, _)| spec.clone())
    }
}

fn arg_string(args: &[Value], index: usize, tool: &str) -> Result<String, EvalError> {
    match args.get(index) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(EvalError::type_error(tool, "string", other)),
        None => Err(EvalError::arity_mismatch(tool, index + 1, args.len())),
    }
}

/// Issues an HTTP GET request and returns the response body.
/// URL must be in the allowed addresses list. Has a 30 second timeout.
///
/// ```lisp
/// (http-get "https://example.test/status")
/// ```
#[orchestrator_macros::tool(name = "http-get", category = "Network", related(http-post))]
fn http_get(args: &[Value]) -> Result<Value, EvalError> {
    let url = arg_string(args, 0, "http-get")?;
    check_address_allowed("http-get", &url)?;
    match ureq::get(&url).timeout(HTTP_TIMEOUT).call() {
        Ok(response) => response
            .into_string()
            .map(Value::String)
            .map_err(|e| EvalError::tool_failure("http-get", e.to_string())),
        Err(err) => Err(EvalError(ErrorObject::new(
            ErrorKind::ToolFailure,
            "http_get_failed",
            err.to_string(),
        ))),
    }
}

/// Issues an HTTP POST request with a string body and returns the response body.
/// URL must be in the allowed addresses list. Has a 30 second timeout.
///
/// ```lisp
/// (http-post "https://example.test/hook" "payload")
/// ```
#[orchestrator_macros::tool(name = "http-post", category = "Network", related(http-get))]
fn http_post(args: &[Value]) -> Result<Value, EvalError> {
    let url = arg_string(args, 0, "http-post")?;
    let body = arg_string(args, 1, "http-post")?;
    check_address_allowed("http-post", &url)?;
    match ureq::post(&url).timeout(HTTP_TIMEOUT).send_string(&body) {
        Ok(response) => response
            .into_string()
            .map(Value::String)
            .map_err(|e| EvalError::tool_failure("http-post", e.to_string())),
        Err(err) => Err(EvalError(ErrorObject::new(
            ErrorKind::ToolFailure,
            "http_post_failed",
            err.to_string(),
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn echo(args: &[Value]) -> Result<Value, EvalError> {
        Ok(args.first().cloned().unwrap_or(Value::Nil))
    }

    #[test]
    fn register_then_invoke() {
        let mut surface = InMemoryToolSurface::new();
        surface.register_tool(ToolSpec::new("echo", "returns its argument"), echo);
        assert!(surface.contains("echo"));
        let result = surface.invoke("echo", &[Value::int(5)]).unwrap();
        assert!(result.is_ok());
    }

    #[test]
    fn invalid_tool_name_is_not_registered() {
        let mut surface = InMemoryToolSurface::new();
        surface.register_tool(ToolSpec::new("has space", "bad name"), echo);
        assert!(!surface.contains("has space"));
    }

    #[test]
    fn unknown_tool_invoke_is_none() {
        let surface = InMemoryToolSurface::new();
        assert!(surface.invoke("nope", &[]).is_none());
    }

    #[test]
    fn address_check_fails_closed_with_no_net_config() {
        NET_CONFIG.with(|cell| *cell.borrow_mut() = None);
        assert!(check_address_allowed("http-get", "https://example.test").is_err());
    }

    #[test]
    fn address_check_enforces_allowlist() {
        NET_CONFIG.with(|cell| {
            *cell.borrow_mut() = Some(NetConfig {
                enabled: true,
                allowed_addresses: vec!["example.test".to_string()],
            })
        });
        assert!(check_address_allowed("http-get", "https://example.test/status").is_ok());
        assert!(check_address_allowed("http-get", "https://evil.test/status").is_err());
    }
}
