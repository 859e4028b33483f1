//! Trialmine Oracle Layer
//!
//! Pluggable implementations of the `FieldOracle` trait from `trialmine-domain`.
//!
//! # Providers
//!
//! - `MockOracle`: Deterministic, scriptable oracle for tests
//! - `OllamaOracle`: Local Ollama API integration
//! - `OpenAiOracle`: OpenAI chat-completions API (needs an API key)
//!
//! # Examples
//!
//! ```
//! use trialmine_llm::MockOracle;
//! use trialmine_domain::traits::FieldOracle;
//!
//! let oracle = MockOracle::new("NOT_FOUND");
//! oracle.add_response("FIELD TO EXTRACT: sponsor", "sponsor: Acme Corp");
//! assert_eq!(oracle.ask("FIELD TO EXTRACT: sponsor\n...").unwrap(), "sponsor: Acme Corp");
//! assert_eq!(oracle.ask("anything else").unwrap(), "NOT_FOUND");
//! ```

#![warn(missing_docs)]

pub mod ollama;
pub mod openai;

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use trialmine_domain::traits::FieldOracle;

pub use ollama::OllamaOracle;
pub use openai::OpenAiOracle;

/// Errors that can occur during oracle calls
#[derive(Error, Debug)]
pub enum OracleError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Response body could not be understood
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Credentials are missing from the environment
    #[error("Missing credentials: {0} is not set")]
    MissingCredentials(String),

    /// Generic error
    #[error("Oracle error: {0}")]
    Other(String),
}

/// Run an async oracle call from the synchronous `FieldOracle` interface
///
/// Reuses the ambient runtime when called from a blocking task, otherwise
/// spins up a private one.
pub(crate) fn block_on<F, T>(future: F) -> Result<T, OracleError>
where
    F: Future<Output = Result<T, OracleError>>,
{
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => handle.block_on(future),
        Err(_) => tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| OracleError::Other(format!("Failed to start runtime: {}", e)))?
            .block_on(future),
    }
}

#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Error,
}

#[derive(Debug, Default)]
struct MockState {
    rules: Vec<(String, Reply)>,
    prompts: Vec<String>,
    fail_all: bool,
}

/// Mock oracle for deterministic testing
///
/// Responses are keyed by substring: the first registered key contained in the
/// prompt decides the reply, otherwise the default response is returned.
///
/// # Examples
///
/// ```
/// use trialmine_llm::MockOracle;
/// use trialmine_domain::traits::FieldOracle;
///
/// let oracle = MockOracle::failing();
/// assert!(oracle.ask("anything").is_err());
/// assert_eq!(oracle.call_count(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct MockOracle {
    default_response: String,
    state: Arc<Mutex<MockState>>,
}

impl MockOracle {
    /// Create a mock that answers every prompt with `response`
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Create a mock whose every call fails
    pub fn failing() -> Self {
        let oracle = Self::new("");
        oracle.state().fail_all = true;
        oracle
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Answer prompts containing `key` with `response`
    pub fn add_response(&self, key: impl Into<String>, response: impl Into<String>) {
        self.state()
            .rules
            .push((key.into(), Reply::Text(response.into())));
    }

    /// Fail prompts containing `key`
    pub fn add_error(&self, key: impl Into<String>) {
        self.state().rules.push((key.into(), Reply::Error));
    }

    /// Number of calls made so far
    pub fn call_count(&self) -> usize {
        self.state().prompts.len()
    }

    /// Number of calls whose prompt contained `key`
    pub fn calls_containing(&self, key: &str) -> usize {
        self.state().prompts.iter().filter(|p| p.contains(key)).count()
    }

    /// Every prompt received, in order
    pub fn prompts(&self) -> Vec<String> {
        self.state().prompts.clone()
    }

    /// Reset the recorded prompts
    pub fn reset_call_count(&self) {
        self.state().prompts.clear();
    }
}

impl Default for MockOracle {
    fn default() -> Self {
        Self::new("NOT_FOUND")
    }
}

impl FieldOracle for MockOracle {
    type Error = OracleError;

    fn ask(&self, prompt: &str) -> Result<String, Self::Error> {
        let mut state = self.state();
        state.prompts.push(prompt.to_string());

        if state.fail_all {
            return Err(OracleError::Other("Mock error".to_string()));
        }

        let reply = state
            .rules
            .iter()
            .find(|(key, _)| prompt.contains(key.as_str()))
            .map(|(_, reply)| reply.clone());

        match reply {
            Some(Reply::Text(text)) => Ok(text),
            Some(Reply::Error) => Err(OracleError::Other("Mock error".to_string())),
            None => Ok(self.default_response.clone()),
        }
    }
}
