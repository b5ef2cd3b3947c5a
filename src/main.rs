use clap::Parser;
use sexp_orchestrator::config::{NetConfig, SandboxConfig, LOG_ENV_VAR};
use sexp_orchestrator::dispatcher::Dispatcher;
use sexp_orchestrator::eval::Interpreter;
use sexp_orchestrator::llm::{HttpEchoLlm, NullLlm};
use sexp_orchestrator::memory::NullMemory;
use sexp_orchestrator::result::Status;
use sexp_orchestrator::sandbox::{FsConfig, FsSandbox, NullFileReader};
use sexp_orchestrator::tools::InMemoryToolSurface;
use sexp_orchestrator::value::Value;
use std::collections::HashMap;
use std::path::PathBuf;

/// Single-shot invocation of the `/task <identifier> [k=v ...] [--flag ...]`
/// surface (spec §6.5). There is no interactive REPL front-end — that is an
/// out-of-scope external collaborator (§1).
#[derive(Parser, Debug)]
#[command(name = "sexp-orchestrator")]
#[command(version)]
#[command(about = "Dispatches a single task, expression, or tool invocation")]
struct CliArgs {
    /// The identifier to dispatch: a registered task name, a tool name, or a
    /// parenthesized S-expression.
    identifier: String,

    /// Zero or more `key=value` parameter pairs passed to the task or tool.
    #[arg(value_name = "KEY=VALUE")]
    params: Vec<String>,

    /// Request that prior conversation be threaded into the LLM call as
    /// message history rather than folded into the prompt (§6.1, §9).
    #[arg(long = "use-history")]
    use_history: bool,

    /// Allowed filesystem root for `read-file` (repeatable). Defaults to the
    /// current directory when none are given.
    #[arg(long = "fs-sandbox", value_name = "PATH", action = clap::ArgAction::Append)]
    fs_paths: Vec<PathBuf>,

    /// Maximum bytes `read-file` will return from a single file.
    #[arg(long = "max-file-size", value_name = "BYTES", default_value_t = 10 * 1024 * 1024)]
    max_file_size: usize,

    /// Enable the `http-get`/`http-post` tools.
    #[arg(long = "allow-network")]
    allow_network: bool,

    /// Allowed outbound network address substring (repeatable). Empty with
    /// `--allow-network` means unrestricted.
    #[arg(long = "net-allow", value_name = "ADDR", action = clap::ArgAction::Append)]
    net_addresses: Vec<String>,

    /// HTTP endpoint the default LLM Capability forwards prompts to. Without
    /// one, the default capability simply echoes the rendered prompt back.
    #[arg(long = "llm-endpoint", value_name = "URL")]
    llm_endpoint: Option<String>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().filter_or(LOG_ENV_VAR, "warn")).init();
    log::debug!("verbosity is controlled by {}", LOG_ENV_VAR);

    let args = CliArgs::parse();

    let sandbox_config = build_sandbox_config(&args);
    let params = parse_params(&args.params);

    let files: Box<dyn sexp_orchestrator::capability::FileReader> =
        match FsSandbox::new(&sandbox_config.fs) {
            Ok(sandbox) => Box::new(sandbox),
            Err(err) => {
                log::warn!("filesystem sandbox unavailable, falling back to no file access: {}", err);
                Box::new(NullFileReader)
            }
        };

    let mut tools = InMemoryToolSurface::new();
    if sandbox_config.net.enabled {
        tools = tools.with_network_tools(sandbox_config.net.clone());
    }

    let llm: Box<dyn sexp_orchestrator::capability::LlmCapability> = match &args.llm_endpoint {
        Some(_) => Box::new(HttpEchoLlm::new(args.llm_endpoint.clone())),
        None => Box::new(NullLlm),
    };

    let interpreter = Interpreter::new(Box::new(tools), llm, Box::new(NullMemory), files);
    let dispatcher = Dispatcher::new(interpreter);

    let result = dispatcher.dispatch(&args.identifier, params, args.use_history);

    println!("{}", render_result(&result));

    let exit_code = match result.status {
        Status::Complete | Status::Continuation | Status::Partial => 0,
        Status::Failed => 1,
    };
    std::process::exit(exit_code);
}

fn build_sandbox_config(args: &CliArgs) -> SandboxConfig {
    let allowed_paths = if args.fs_paths.is_empty() {
        vec![PathBuf::from(".")]
    } else {
        args.fs_paths.clone()
    };

    SandboxConfig {
        fs: FsConfig {
            allowed_paths,
            max_file_size: args.max_file_size,
        },
        net: NetConfig {
            enabled: args.allow_network,
            allowed_addresses: args.net_addresses.clone(),
        },
    }
}

/// Splits `k=v` pairs into a parameter map; bare strings on the right-hand
/// side (the command line carries no type annotations), matching the
/// `use-history`-agnostic parameter shape of a task invocation (§6.5).
fn parse_params(pairs: &[String]) -> HashMap<String, Value> {
    let mut params = HashMap::new();
    for pair in pairs {
        if let Some((key, value)) = pair.split_once('=') {
            params.insert(key.to_string(), Value::String(value.to_string()));
        } else {
            log::warn!("ignoring malformed parameter (expected key=value): {}", pair);
        }
    }
    params
}

fn render_result(result: &sexp_orchestrator::result::ResultRecord) -> String {
    match result.status {
        Status::Failed => {
            let err = result
                .error
                .as_ref()
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unknown error".to_string());
            format!("FAILED: {}", err)
        }
        status => format!("{:?}: {}", status, result.content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_params_splits_key_value_pairs() {
        let params = parse_params(&["name=Alice".to_string(), "age=30".to_string()]);
        assert!(matches!(params.get("name"), Some(Value::String(s)) if s == "Alice"));
        assert!(matches!(params.get("age"), Some(Value::String(s)) if s == "30"));
    }

    #[test]
    fn parse_params_ignores_malformed_pairs() {
        let params = parse_params(&["no-equals-sign".to_string()]);
        assert!(params.is_empty());
    }

    #[test]
    fn build_sandbox_config_defaults_to_current_directory() {
        let args = CliArgs {
            identifier: "noop".to_string(),
            params: vec![],
            use_history: false,
            fs_paths: vec![],
            max_file_size: 1024,
            allow_network: false,
            net_addresses: vec![],
            llm_endpoint: None,
        };
        let config = build_sandbox_config(&args);
        assert_eq!(config.fs.allowed_paths, vec![PathBuf::from(".")]);
        assert!(!config.net.enabled);
    }

    #[test]
    fn build_sandbox_config_honors_network_allowlist() {
        let args = CliArgs {
            identifier: "noop".to_string(),
            params: vec![],
            use_history: false,
            fs_paths: vec![PathBuf::from("/tmp")],
            max_file_size: 1024,
            allow_network: true,
            net_addresses: vec!["example.test".to_string()],
            llm_endpoint: None,
        };
        let config = build_sandbox_config(&args);
        assert!(config.net.enabled);
        assert_eq!(config.net.allowed_addresses, vec!["example.test".to_string()]);
    }
}
