// ABOUTME: Default LLM capability implementations (§6.1, §A.4)

use crate::capability::{LlmCapability, ToolSpec};
use crate::result::ResultRecord;
use crate::value::Value;

/// Stands in for a real model backend: always completes with `nil`. Useful
/// as a default when no LLM has been wired in (tests, dry runs).
pub struct NullLlm;

impl LlmCapability for NullLlm {
    fn llm_call(
        &self,
        _prompt: &str,
        _model_id: &str,
        _tools: &[ToolSpec],
        _output_schema: Option<&str>,
        _message_history: Option<&[String]>,
    ) -> ResultRecord {
        ResultRecord::complete(Value::Nil)
    }
}

/// Echoes the rendered prompt back as the completion. Grounded in the
/// project's earlier sandboxed HTTP client: makes an outbound call through
/// `ureq` when an endpoint is configured, otherwise degrades to a literal
/// echo so the rest of the pipeline still has something to evaluate.
pub struct HttpEchoLlm {
    endpoint: Option<String>,
}

impl HttpEchoLlm {
    pub fn new(endpoint: Option<String>) -> Self {
        HttpEchoLlm { endpoint }
    }
}

impl LlmCapability for HttpEchoLlm {
    fn llm_call(
        &self,
        prompt: &str,
        model_id: &str,
        _tools: &[ToolSpec],
        _output_schema: Option<&str>,
        _message_history: Option<&[String]>,
    ) -> ResultRecord {
        let Some(endpoint) = &self.endpoint else {
            return ResultRecord::complete(Value::String(prompt.to_string()));
        };

        let body = serde_json::json!({ "model": model_id, "prompt": prompt });
        match ureq::post(endpoint).send_json(body) {
            Ok(response) => match response.into_string() {
                Ok(text) => ResultRecord::complete(Value::String(text)),
                Err(err) => ResultRecord::failed(crate::error::ErrorObject::new(
                    crate::error::ErrorKind::TaskFailure,
                    "llm_response_unreadable",
                    err.to_string(),
                )),
            },
            // §6.1/§4.5: LLM capability failures surface as TaskFailure; a
            // network timeout underneath is the one case that surfaces as
            // Timeout instead.
            Err(ureq::Error::Status(_, _)) => ResultRecord::failed(crate::error::ErrorObject::new(
                crate::error::ErrorKind::TaskFailure,
                "llm_call_failed",
                "llm endpoint returned an error status",
            )),
            Err(err) => ResultRecord::failed(crate::error::ErrorObject::new(
                crate::error::ErrorKind::Timeout,
                "llm_call_timeout",
                err.to_string(),
            )),
        }
    }
}
