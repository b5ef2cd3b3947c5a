// ABOUTME: Sandbox and CLI configuration built from flags in main.rs (§A.5)

use crate::sandbox::FsConfig;

/// Network sandbox configuration: whether outbound calls are permitted at
/// all, and an optional address allowlist (empty = unrestricted once
/// enabled), mirrored one-to-one from the teacher's `NetConfig`.
#[derive(Debug, Clone, Default)]
pub struct NetConfig {
    pub enabled: bool,
    pub allowed_addresses: Vec<String>,
}

impl NetConfig {
    pub fn is_address_allowed(&self, address: &str) -> bool {
        if !self.enabled {
            return false;
        }
        self.allowed_addresses.is_empty()
            || self.allowed_addresses.iter().any(|allowed| address.contains(allowed))
    }
}

/// Combined sandbox configuration handed to the default capability
/// implementations at startup (§A.4, §A.5): filesystem roots for the File
/// Reader, network policy for the `http-get`/`http-post` tools.
#[derive(Debug, Clone, Default)]
pub struct SandboxConfig {
    pub fs: FsConfig,
    pub net: NetConfig,
}

/// Default model identifier used when a task has no `preferred_model` and
/// the caller supplies none (§4.5 step 2: "the template's requested model
/// or system default").
pub const DEFAULT_MODEL: &str = "default";

/// Token budget passed to the Memory Facade for automatic context retrieval
/// (§4.4.3, §4.9) when a template opts in via `auto_context` and neither an
/// explicit `file_context` argument nor declared `file_paths` yielded any.
pub const DEFAULT_MAX_CONTEXT_TOKENS: usize = 2000;

/// Environment variable `env_logger` reads to set verbosity; documented here
/// so the CLI's `--help` can point users at it (§A.3).
pub const LOG_ENV_VAR: &str = "SEXP_ORCHESTRATOR_LOG";
