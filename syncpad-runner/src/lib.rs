//! # syncpad-runner — execution-service client
//!
//! Stateless request/response code execution against external compiler
//! endpoints, one endpoint per executable language. The registry maps a
//! language slot to its endpoint; slots without one (`other`, or anything
//! unconfigured) are blocked client-side with
//! [`ExecError::UnsupportedLanguage`] before any dispatch.
//!
//! Wire contract, per endpoint:
//!
//! - request: `POST {"code": "...", "input": "..."}`
//! - response: `{"output": "...", "time": <ms>, "memory": <kB>}` on
//!   success, `{"error": "..."}` on failure
//!
//! Every request runs under a client-side timeout so a hung backend
//! surfaces as [`ExecError::Timeout`], distinct from a reported failure.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use syncpad_core::Language;

/// Execution errors.
#[derive(Debug, Clone, Error)]
pub enum ExecError {
    /// No execution backend exists for this slot; rejected locally.
    #[error("no execution backend for {0}")]
    UnsupportedLanguage(Language),
    /// The backend did not answer within the configured timeout.
    #[error("execution timed out after {0:?}")]
    Timeout(Duration),
    /// The backend answered with a reported failure (compile error,
    /// runtime error, resource limit).
    #[error("execution failed: {0}")]
    Failed(String),
    /// The request never completed (connection refused, malformed body).
    #[error("execution transport error: {0}")]
    Transport(String),
}

/// Endpoint registry and request tunables.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    endpoints: HashMap<Language, String>,
    /// Client-side deadline for one execution round trip.
    pub timeout: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            endpoints: HashMap::new(),
            timeout: Duration::from_secs(15),
        }
    }
}

impl RunnerConfig {
    /// Read endpoints from `SYNCPAD_PYTHON_API` and `SYNCPAD_JAVA_API`;
    /// absent variables simply leave that language unsupported.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        for (language, var) in [
            (Language::Python, "SYNCPAD_PYTHON_API"),
            (Language::Java, "SYNCPAD_JAVA_API"),
        ] {
            if let Ok(url) = std::env::var(var) {
                config.endpoints.insert(language, url);
            }
        }
        config
    }

    pub fn with_endpoint(mut self, language: Language, url: impl Into<String>) -> Self {
        self.endpoints.insert(language, url.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Endpoint for a language, if one is registered.
    pub fn endpoint(&self, language: Language) -> Option<&str> {
        self.endpoints.get(&language).map(String::as_str)
    }
}

/// One successful execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecReport {
    pub stdout: String,
    pub time_ms: u64,
    pub memory_kb: u64,
}

#[derive(Serialize)]
struct ExecRequest<'a> {
    code: &'a str,
    input: &'a str,
}

/// Raw endpoint response; exactly one of `error` / `output` is meaningful.
#[derive(Deserialize)]
struct ExecResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    output: Option<String>,
    #[serde(default)]
    time: Option<u64>,
    #[serde(default)]
    memory: Option<u64>,
}

/// Execution-service client.
pub struct CodeRunner {
    http: reqwest::Client,
    config: RunnerConfig,
}

impl CodeRunner {
    pub fn new(config: RunnerConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Run `code` with `stdin` on the backend registered for `language`.
    pub async fn execute(
        &self,
        language: Language,
        code: &str,
        stdin: &str,
    ) -> Result<ExecReport, ExecError> {
        if !language.is_executable() {
            return Err(ExecError::UnsupportedLanguage(language));
        }
        let endpoint = self
            .config
            .endpoint(language)
            .ok_or(ExecError::UnsupportedLanguage(language))?
            .to_string();

        log::debug!("dispatching {language} execution to {endpoint}");
        let response = tokio::time::timeout(
            self.config.timeout,
            self.dispatch(&endpoint, code, stdin),
        )
        .await
        .map_err(|_| ExecError::Timeout(self.config.timeout))??;

        if let Some(error) = response.error {
            return Err(ExecError::Failed(error));
        }
        Ok(ExecReport {
            stdout: response.output.unwrap_or_default(),
            time_ms: response.time.unwrap_or_default(),
            memory_kb: response.memory.unwrap_or_default(),
        })
    }

    async fn dispatch(
        &self,
        endpoint: &str,
        code: &str,
        stdin: &str,
    ) -> Result<ExecResponse, ExecError> {
        self.http
            .post(endpoint)
            .json(&ExecRequest { code, input: stdin })
            .send()
            .await
            .map_err(|e| ExecError::Transport(e.to_string()))?
            .error_for_status()
            .map_err(|e| ExecError::Transport(e.to_string()))?
            .json()
            .await
            .map_err(|e| ExecError::Transport(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_has_no_endpoints() {
        let config = RunnerConfig::default();
        assert!(config.endpoint(Language::Python).is_none());
        assert!(config.endpoint(Language::Java).is_none());
        assert_eq!(config.timeout, Duration::from_secs(15));
    }

    #[test]
    fn test_with_endpoint_registers() {
        let config = RunnerConfig::default()
            .with_endpoint(Language::Python, "http://run/python")
            .with_endpoint(Language::Java, "http://run/java");
        assert_eq!(config.endpoint(Language::Python), Some("http://run/python"));
        assert_eq!(config.endpoint(Language::Java), Some("http://run/java"));
    }

    #[tokio::test]
    async fn test_other_slot_blocked_before_dispatch() {
        let runner = CodeRunner::new(
            // Even a registered endpoint must not be used for `other`.
            RunnerConfig::default().with_endpoint(Language::Python, "http://run/python"),
        );
        let err = runner.execute(Language::Other, "text", "").await.unwrap_err();
        assert!(matches!(err, ExecError::UnsupportedLanguage(Language::Other)));
    }

    #[tokio::test]
    async fn test_unregistered_language_is_unsupported() {
        let runner = CodeRunner::new(RunnerConfig::default());
        let err = runner
            .execute(Language::Python, "print(1)", "")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ExecError::UnsupportedLanguage(Language::Python)
        ));
    }

    #[test]
    fn test_response_decoding_success_shape() {
        let response: ExecResponse =
            serde_json::from_str(r#"{"output":"42\n","time":12,"memory":2048}"#).unwrap();
        assert_eq!(response.output.as_deref(), Some("42\n"));
        assert_eq!(response.time, Some(12));
        assert_eq!(response.memory, Some(2048));
        assert!(response.error.is_none());
    }

    #[test]
    fn test_response_decoding_error_shape() {
        let response: ExecResponse =
            serde_json::from_str(r#"{"error":"NameError: x"}"#).unwrap();
        assert_eq!(response.error.as_deref(), Some("NameError: x"));
        assert!(response.output.is_none());
    }
}
